//! Passage chunker for local documents.
//!
//! Three-step strategy:
//! 1. Split at blank lines (natural paragraph boundaries)
//! 2. Merge small paragraphs up to the character budget; split oversized
//!    paragraphs at single newlines
//! 3. Carry a trailing overlap of whole lines from each passage into the
//!    next, so answers spanning a boundary still retrieve

/// A chunked passage with its 1-based line span in the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Chunk a document into passages of roughly `budget` characters with
/// `overlap` characters of carry-over between neighbors.
pub fn chunk_text(content: &str, budget: usize, overlap: usize) -> Vec<Passage> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    let budget = budget.max(1);

    let lines: Vec<&str> = content.lines().collect();
    let segments = split_at_blank_lines(&lines);

    let mut passages = Vec::new();
    let mut current_start = 0usize; // line index
    let mut current_end = 0usize;
    let mut current_chars = 0usize;
    let mut started = false;

    for seg in &segments {
        let seg_chars = line_span_chars(&lines, seg.start, seg.end);

        if seg_chars > budget {
            // Flush the accumulator first
            if started {
                passages.push(make_passage(&lines, current_start, current_end));
                started = false;
                current_chars = 0;
            }
            split_large_segment(&lines, seg.start, seg.end, budget, &mut passages);
        } else if started && current_chars + seg_chars > budget {
            passages.push(make_passage(&lines, current_start, current_end));
            current_start = seg.start;
            current_end = seg.end;
            current_chars = seg_chars;
        } else {
            if !started {
                current_start = seg.start;
                started = true;
            }
            current_end = seg.end;
            current_chars += seg_chars;
        }
    }

    if started {
        passages.push(make_passage(&lines, current_start, current_end));
    }

    if overlap > 0 {
        apply_overlap(&lines, &mut passages, overlap);
    }

    passages
}

struct Segment {
    start: usize,
    end: usize,
}

fn split_at_blank_lines(lines: &[&str]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut seg_start = None;

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            if let Some(start) = seg_start.take() {
                segments.push(Segment {
                    start,
                    end: i.saturating_sub(1),
                });
            }
        } else if seg_start.is_none() {
            seg_start = Some(i);
        }
    }

    if let Some(start) = seg_start {
        segments.push(Segment {
            start,
            end: lines.len() - 1,
        });
    }

    segments
}

fn line_span_chars(lines: &[&str], start: usize, end: usize) -> usize {
    lines[start..=end].iter().map(|l| l.chars().count()).sum()
}

fn make_passage(lines: &[&str], start: usize, end: usize) -> Passage {
    Passage {
        content: lines[start..=end].join("\n"),
        start_line: start + 1,
        end_line: end + 1,
    }
}

fn split_large_segment(
    lines: &[&str],
    start: usize,
    end: usize,
    budget: usize,
    passages: &mut Vec<Passage>,
) {
    let mut chunk_start = start;
    let mut chars = 0usize;

    for i in start..=end {
        let line_chars = lines[i].chars().count();
        if chars + line_chars > budget && i > chunk_start {
            passages.push(make_passage(lines, chunk_start, i - 1));
            chunk_start = i;
            chars = line_chars;
        } else {
            chars += line_chars;
        }
    }

    if chunk_start <= end {
        passages.push(make_passage(lines, chunk_start, end));
    }
}

/// Extend each passage's start backward by whole lines until roughly
/// `overlap` characters of the previous passage are repeated. Never
/// reaches back to the previous passage's own start, so passages cannot
/// collapse into duplicates.
fn apply_overlap(lines: &[&str], passages: &mut [Passage], overlap: usize) {
    for i in 1..passages.len() {
        let prev_start = passages[i - 1].start_line;
        let orig_start = passages[i].start_line;
        let end_line = passages[i].end_line;
        let mut start = orig_start;
        let mut chars = 0usize;

        while start > prev_start + 1 && chars < overlap {
            let candidate = start - 1; // 1-based line above
            let line_chars = lines[candidate - 1].chars().count();
            if chars + line_chars > overlap {
                break;
            }
            chars += line_chars;
            start = candidate;
        }

        if start < orig_start {
            passages[i].start_line = start;
            passages[i].content = lines[start - 1..end_line].join("\n");
        }
    }
}
