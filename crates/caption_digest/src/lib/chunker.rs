/// Rough words-to-tokens factor used for budgeting
const TOKENS_PER_WORD: f64 = 1.3;

/// A contiguous run of transcript lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub ordinal: usize,
    pub text: String,
}

/// Estimated token count of a single line
pub fn estimate_tokens(line: &str) -> usize {
    (line.split_whitespace().count() as f64 * TOKENS_PER_WORD) as usize
}

/// Splits `text` into line-aligned chunks whose estimated size stays within `budget`.
///
/// Lines are never split, so a single line over budget becomes its own chunk.
/// Joining the chunk texts with `\n` gives back the input lines in order, with
/// `\r\n` endings normalized and trailing line breaks dropped.
pub fn chunk_text(text: &str, budget: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_tokens = 0;

    for line in text.trim_end_matches(['\n', '\r']).lines() {
        let line_tokens = estimate_tokens(line);

        if current_tokens + line_tokens > budget && !current.is_empty() {
            chunks.push(Chunk {
                ordinal: chunks.len(),
                text: current.join("\n"),
            });
            current.clear();
            current_tokens = 0;
        }

        current.push(line);
        current_tokens += line_tokens;
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            ordinal: chunks.len(),
            text: current.join("\n"),
        });
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("one"), 1);
        assert_eq!(estimate_tokens("one two three four five"), 6);
        assert_eq!(estimate_tokens("  spaced   out  "), 2);
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_text("hello there\ngeneral kenobi", 2048);
        assert_eq!(
            chunks,
            vec![Chunk {
                ordinal: 0,
                text: "hello there\ngeneral kenobi".into()
            }]
        );
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_text("", 10).is_empty());
    }

    #[test]
    fn test_flushes_before_exceeding_budget() {
        // each line estimates to 2 tokens
        let text = "a b\nc d\ne f\ng h";
        let chunks = chunk_text(text, 4);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "a b\nc d");
        assert_eq!(chunks[1].text, "e f\ng h");
        assert_eq!(
            chunks.iter().map(|c| c.ordinal).collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[test]
    fn test_oversized_line_is_kept_whole() {
        let long_line = "word ".repeat(40);
        let text = format!("short one\n{}\nshort two", long_line.trim_end());
        let chunks = chunk_text(&text, 10);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].text, long_line.trim_end());
        assert!(estimate_tokens(&chunks[1].text) > 10);
    }

    #[test]
    fn test_rejoined_chunks_reproduce_lines() {
        let text = (0..200)
            .map(|i| format!("line {i} with a handful of words in it"))
            .collect::<Vec<_>>()
            .join("\n");

        for budget in [1, 12, 50, 2048] {
            let chunks = chunk_text(&text, budget);
            assert_eq!(rejoin(&chunks), text, "budget {budget}");
            for chunk in &chunks {
                let single_line = !chunk.text.contains('\n');
                assert!(
                    single_line || chunk.text.lines().map(estimate_tokens).sum::<usize>() <= budget
                );
            }
        }
    }

    #[test]
    fn test_blank_lines_survive() {
        let text = "first\n\n\nsecond";
        assert_eq!(rejoin(&chunk_text(text, 1)), text);
    }

    #[test]
    fn test_trailing_newlines_and_crlf_are_normalized() {
        let crlf = chunk_text("a b\r\nc d\r\n", 4);
        assert_eq!(crlf, chunk_text("a b\nc d", 4));
        assert_eq!(rejoin(&crlf), "a b\nc d");

        let split = chunk_text("a b\r\nc d\r\n", 2);
        assert_eq!(
            split.iter().map(|c| c.text.as_str()).collect::<Vec<_>>(),
            vec!["a b", "c d"]
        );

        for text in ["first\n", "first\n\n\n", "first\r\n\r\n"] {
            assert_eq!(rejoin(&chunk_text(text, 2048)), "first", "{text:?}");
        }
        assert!(chunk_text("\n\r\n", 10).is_empty());
    }

    #[test]
    fn test_rechunking_with_trailing_newlines_is_stable() {
        let text = "one two\r\nthree four\r\n\r\nfive six\n\n";
        for budget in [2, 5, 2048] {
            let first = chunk_text(text, budget);
            let second = chunk_text(&rejoin(&first), budget);
            assert_eq!(first, second, "budget {budget}");
        }
    }

    #[test]
    fn test_rechunking_is_stable() {
        let text = (0..60)
            .map(|i| format!("sentence number {i} goes here"))
            .collect::<Vec<_>>()
            .join("\n");
        let first = chunk_text(&text, 40);
        let second = chunk_text(&rejoin(&first), 40);
        assert_eq!(first, second);
    }
}
