// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Prompt templates for search, question answering and summaries.

use super::client::{ChatMessage, CompletionRequest};
use crate::notes::Note;

pub const NOTE_SEPARATOR: &str = "\n\n---\n\n";

pub const SEARCH_FALLBACK: &str = "No results found.";
pub const SUMMARY_FALLBACK: &str = "Unable to generate summary.";
pub const ANSWER_FALLBACK: &str = "Unable to generate answer.";

const SEARCH_SYSTEM: &str = "You are a helpful assistant that searches through user notes and \
provides relevant information. Be concise and accurate.";

const SUMMARY_SYSTEM: &str = "You are a helpful assistant that creates organized summaries of \
user notes. For each note, create a clear section with the note title as a heading (## Title) \
followed by a concise summary of that note's key points. Group related notes together when \
appropriate, but always maintain clear separation between different notes using headings.";

const ANSWER_SYSTEM: &str = "You are a helpful assistant that answers questions based on the \
user's personal knowledge base. Use only the provided context to answer. If the context doesn't \
contain the answer, say so.";

/// `Title: ...\nContent: ...` blocks, used as search and question context.
pub fn context_of(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|n| format!("Title: {}\nContent: {}", n.title, n.content))
        .collect::<Vec<_>>()
        .join(NOTE_SEPARATOR)
}

fn summary_input_of(notes: &[Note]) -> String {
    notes
        .iter()
        .map(|n| format!("NOTE: \"{}\"\n\n{}", n.title, n.content))
        .collect::<Vec<_>>()
        .join(NOTE_SEPARATOR)
}

pub fn search(model: &str, query: &str, notes: &[Note]) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(SEARCH_SYSTEM),
            ChatMessage::user(format!(
                "Based on the following notes, answer this query: \"{query}\"\n\nNotes:\n{}",
                context_of(notes)
            )),
        ],
        temperature: 0.5,
        max_tokens: 500,
    }
}

pub fn summarize(model: &str, notes: &[Note]) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(SUMMARY_SYSTEM),
            ChatMessage::user(format!(
                "Create a well-organized summary of the following notes. For each note, use the \
                 format:\n\n## [Note Title]\n\n[Summary of key points from this note]\n\n\
                 Separate different notes clearly with headings. Group related information when \
                 it makes sense, but keep each note distinct:\n\n{}",
                summary_input_of(notes)
            )),
        ],
        temperature: 0.5,
        max_tokens: 2000,
    }
}

pub fn answer(model: &str, question: &str, notes: &[Note]) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(ANSWER_SYSTEM),
            ChatMessage::user(format!(
                "Question: {question}\n\nContext from user's notes:\n{}",
                context_of(notes)
            )),
        ],
        temperature: 0.7,
        max_tokens: 1000,
    }
}
