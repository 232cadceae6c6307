
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::loaders::Document;

const CODE_FENCE: &str = "```";
const PARAGRAPH_BREAK: &str = "\n\n";
const SENTENCE_ENDINGS: [char; 3] = ['.', '!', '?'];
/// Characters per token assumed when cutting text that has no whitespace
const CHARS_PER_TOKEN: usize = 4;

/// A piece of a loaded document ready for embedding
#[derive(Debug, Clone, PartialEq)]
pub struct ContentChunk {
    pub content: String,
    /// `source` of the parent document, empty when it had none
    pub source: String,
    /// Position within the parent document
    pub chunk_index: usize,
    /// Estimated token count
    pub token_count: usize,
    /// Metadata copied from the parent document
    pub metadata: BTreeMap<String, String>,
}

/// Token budgets for splitting documents. All sizes are estimated tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Documents at or under this size stay whole
    pub target_chunk_size: usize,
    /// Hard ceiling outside fenced code
    pub max_chunk_size: usize,
    /// Chunks below this are merged into their neighbour
    pub min_chunk_size: usize,
    /// Trailing words of a chunk repeated at the start of the next
    pub overlap_size: usize,
    pub preserve_code_blocks: bool,
    /// Break oversized paragraphs at sentence ends instead of anywhere between words
    pub sentence_boundary_splitting: bool,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            target_chunk_size: 650,
            max_chunk_size: 1000,
            min_chunk_size: 100,
            overlap_size: 50,
            preserve_code_blocks: true,
            sentence_boundary_splitting: true,
        }
    }
}

/// Chunk every document in order. Chunk indices restart for each document.
#[inline]
pub fn chunk_documents(documents: &[Document], config: &ChunkingConfig) -> Vec<ContentChunk> {
    documents
        .iter()
        .flat_map(|document| chunk_document(document, config))
        .collect()
}

#[inline]
pub fn chunk_document(document: &Document, config: &ChunkingConfig) -> Vec<ContentChunk> {
    let content = document.content.trim();
    if content.is_empty() {
        return Vec::new();
    }

    let source = document.source().unwrap_or_default();
    let pieces = if estimate_token_count(content) <= config.target_chunk_size {
        vec![content.to_string()]
    } else if config.preserve_code_blocks && contains_code_block(content) {
        split_with_code_preservation(content, config)
    } else {
        split_by_paragraphs(content, config)
    };

    let chunks: Vec<ContentChunk> = pieces
        .into_iter()
        .map(|piece| ContentChunk {
            token_count: estimate_token_count(&piece),
            content: piece,
            source: source.to_string(),
            chunk_index: 0,
            metadata: document.metadata.clone(),
        })
        .collect();

    let mut chunks = merge_small_chunks(chunks, config);
    if config.overlap_size > 0 {
        add_overlap(&mut chunks, config.overlap_size);
    }
    for (index, chunk) in chunks.iter_mut().enumerate() {
        chunk.chunk_index = index;
    }

    debug!("Chunked '{}' into {} chunks", source, chunks.len());
    chunks
}

/// Greedy accumulator shared by every splitting strategy: pieces are
/// appended until the next one would push the running estimate past `budget`.
struct Packer {
    budget: usize,
    separator: &'static str,
    current: String,
    words: usize,
    punctuation: usize,
    done: Vec<String>,
}

impl Packer {
    fn new(budget: usize, separator: &'static str) -> Self {
        Self {
            budget,
            separator,
            current: String::new(),
            words: 0,
            punctuation: 0,
            done: Vec::new(),
        }
    }

    fn push(&mut self, piece: &str) {
        self.push_with(piece, true);
    }

    /// Append `piece` followed by the separator
    fn push_with(&mut self, piece: &str, may_break: bool) {
        self.push_part(piece, may_break);
        self.end_piece();
    }

    /// Append `piece` verbatim, starting a new output first when it would
    /// not fit and `may_break` allows it
    fn push_part(&mut self, piece: &str, may_break: bool) {
        let words = piece.split_whitespace().count();
        let punctuation = count_punctuation(piece);
        let estimate = token_estimate(self.words + words, self.punctuation + punctuation);

        if may_break && estimate > self.budget && !self.current.trim().is_empty() {
            self.flush();
        }
        self.current.push_str(piece);
        self.words += words;
        self.punctuation += punctuation;
    }

    fn end_piece(&mut self) {
        self.current.push_str(self.separator);
    }

    fn flush(&mut self) {
        let trimmed = self.current.trim();
        if !trimmed.is_empty() {
            self.done.push(trimmed.to_string());
        }
        self.current.clear();
        self.words = 0;
        self.punctuation = 0;
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.done
    }
}

/// Line-wise split bounded by `max_chunk_size` that never breaks inside a fence.
/// Oversized lines outside a fence are broken between words.
fn split_with_code_preservation(content: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut packer = Packer::new(config.max_chunk_size, "\n");
    let mut in_fence = false;

    for line in content.lines() {
        if !in_fence && estimate_token_count(line) > config.max_chunk_size {
            for word in word_spans(line, config.target_chunk_size) {
                packer.push_part(word, true);
            }
            packer.end_piece();
            continue;
        }

        // An opening fence may start a new chunk, its closing fence stays with the block
        packer.push_with(line, !in_fence);
        if line.trim_start().starts_with(CODE_FENCE) {
            in_fence = !in_fence;
        }
    }

    packer.finish()
}

/// Pack paragraphs up to `target_chunk_size`. A paragraph over
/// `max_chunk_size` is fed in sentence by sentence (or word by word), and
/// any sentence still over the limit word by word.
fn split_by_paragraphs(content: &str, config: &ChunkingConfig) -> Vec<String> {
    let mut packer = Packer::new(config.target_chunk_size, PARAGRAPH_BREAK);

    for paragraph in content.split(PARAGRAPH_BREAK) {
        if paragraph.trim().is_empty() {
            continue;
        }

        if estimate_token_count(paragraph) <= config.max_chunk_size {
            packer.push(paragraph);
            continue;
        }

        let spans = if config.sentence_boundary_splitting {
            sentence_spans(paragraph)
        } else {
            vec![paragraph]
        };
        for span in spans {
            if estimate_token_count(span) <= config.max_chunk_size {
                packer.push_part(span, true);
            } else {
                for word in word_spans(span, config.target_chunk_size) {
                    packer.push_part(word, true);
                }
            }
        }
        packer.end_piece();
    }

    packer.finish()
}

/// Consecutive slices of `text`, each ending after a `.`, `!` or `?` that is
/// followed by whitespace or the end of the text. Concatenated they give back `text`.
fn sentence_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut rest = text;
    while let Some(end) = sentence_end(rest) {
        let (sentence, tail) = rest.split_at(end);
        spans.push(sentence);
        rest = tail;
    }
    if !rest.is_empty() {
        spans.push(rest);
    }
    spans
}

fn sentence_end(text: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        let at_boundary = chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
        if SENTENCE_ENDINGS.contains(&c) && at_boundary {
            return Some(index + c.len_utf8());
        }
    }
    None
}

/// Words of `text` with their trailing whitespace kept. Runs without
/// whitespace longer than `budget` tokens' worth of characters are cut.
fn word_spans(text: &str, budget: usize) -> Vec<&str> {
    let max_chars = budget.max(1) * CHARS_PER_TOKEN;
    text.split_inclusive(char::is_whitespace)
        .flat_map(|word| hard_wrap(word, max_chars))
        .collect()
}

fn hard_wrap(word: &str, max_chars: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = word;
    while let Some((end, _)) = rest.char_indices().nth(max_chars) {
        let (head, tail) = rest.split_at(end);
        pieces.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

/// Fold each undersized chunk into the one before it while the pair stays
/// within `max_chunk_size`
fn merge_small_chunks(chunks: Vec<ContentChunk>, config: &ChunkingConfig) -> Vec<ContentChunk> {
    let mut merged: Vec<ContentChunk> = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        if let Some(previous) = merged.last_mut() {
            let fits = previous.token_count + chunk.token_count <= config.max_chunk_size;
            if previous.token_count < config.min_chunk_size
                && chunk.token_count < config.min_chunk_size
                && fits
            {
                previous.content.push_str(PARAGRAPH_BREAK);
                previous.content.push_str(&chunk.content);
                previous.token_count += chunk.token_count;
                continue;
            }
        }
        merged.push(chunk);
    }

    merged
}

/// Prefix every chunk after the first with the tail of its predecessor
fn add_overlap(chunks: &mut [ContentChunk], overlap_tokens: usize) {
    let tails: Vec<String> = chunks
        .iter()
        .map(|chunk| overlap_tail(&chunk.content, overlap_tokens))
        .collect();

    for (chunk, tail) in chunks.iter_mut().skip(1).zip(tails) {
        if tail.is_empty() {
            continue;
        }
        chunk.token_count += estimate_token_count(&tail);
        chunk.content = format!("{tail}{PARAGRAPH_BREAK}{}", chunk.content);
    }
}

/// The last `overlap_tokens * 0.75` words, or nothing when the chunk is
/// not longer than that
fn overlap_tail(content: &str, overlap_tokens: usize) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    let wanted = overlap_tokens * 3 / 4;

    if words.len() <= wanted {
        return String::new();
    }
    words[words.len() - wanted..].join(" ")
}

/// Rough token estimate: words / 0.75 plus a tenth of a token per ASCII punctuation mark
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    token_estimate(text.split_whitespace().count(), count_punctuation(text))
}

fn token_estimate(words: usize, punctuation: usize) -> usize {
    (punctuation as f64).mul_add(0.1, words as f64 / 0.75) as usize
}

fn count_punctuation(text: &str) -> usize {
    text.chars().filter(char::is_ascii_punctuation).count()
}

/// Fenced or indented code anywhere in the text
fn contains_code_block(text: &str) -> bool {
    text.contains(CODE_FENCE) || text.lines().any(|line| line.starts_with("    "))
}
