//! Разбиение текста на фрагменты для синтеза речи
//!
//! Текст делится по границам предложений; предложения жадно
//! накапливаются во фрагмент, пока не будет превышен лимит символов.
//! Предложение длиннее лимита становится отдельным фрагментом —
//! посередине предложения текст не режется никогда.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::TextChunk;
use crate::utils::common::normalize_whitespace;

static HTML_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Подготовка текста к синтезу: удаление HTML-тегов и сущностей,
/// нормализация пробелов
pub fn prepare_text(text: &str) -> String {
    let text = HTML_TAG_REGEX.replace_all(text, "");

    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&apos;", "'");

    normalize_whitespace(&text)
}

/// Является ли символ терминатором предложения
fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Разбиение нормализованного текста на предложения.
/// Терминатор закрывает предложение только перед пробелом или концом
/// текста, поэтому "3.14" не считается границей.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if is_terminator(c) {
            // Поглощаем серию терминаторов ("...", "?!")
            while let Some(&next) = chars.peek() {
                if is_terminator(next) {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }

            let at_boundary = match chars.peek() {
                None => true,
                Some(next) => next.is_whitespace(),
            };

            if at_boundary {
                let sentence = current.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                current.clear();
            }
        }
    }

    let remainder = current.trim();
    if !remainder.is_empty() {
        sentences.push(remainder.to_string());
    }

    sentences
}

/// Разбиение текста на фрагменты не длиннее `max_chunk_chars` символов.
/// Пустой вход дает пустую последовательность.
pub fn split(text: &str, max_chunk_chars: usize) -> Vec<TextChunk> {
    let normalized = prepare_text(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<TextChunk> = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(&normalized) {
        if current.is_empty() {
            current = sentence;
        } else if current.chars().count() + 1 + sentence.chars().count() <= max_chunk_chars {
            current.push(' ');
            current.push_str(&sentence);
        } else {
            chunks.push(TextChunk {
                index: chunks.len(),
                content: std::mem::take(&mut current),
            });
            current = sentence;
        }
    }

    if !current.is_empty() {
        chunks.push(TextChunk {
            index: chunks.len(),
            content: current,
        });
    }

    chunks
}
