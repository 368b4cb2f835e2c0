use crate::richtext;
use crate::types::ContentSection;

pub const WORDS_PER_MINUTE: usize = 200;

/// Number of whitespace-separated words across every section body.
pub fn word_count(content: &[ContentSection]) -> usize {
    richtext::as_text(content.iter().flat_map(|section| section.body.iter()))
        .split_whitespace()
        .count()
}

/// Estimated reading time in whole minutes, rounded up.
pub fn reading_time(content: &[ContentSection]) -> usize {
    minutes_for(word_count(content))
}

pub fn minutes_for(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::Block;

    fn section(words: usize) -> ContentSection {
        ContentSection {
            heading: "Heading words are not counted".to_string(),
            body: vec![Block::paragraph(vec!["word"; words].join(" "))],
        }
    }

    #[test]
    fn test_minutes_boundaries() {
        assert_eq!(minutes_for(0), 0);
        assert_eq!(minutes_for(1), 1);
        assert_eq!(minutes_for(200), 1);
        assert_eq!(minutes_for(201), 2);
        assert_eq!(minutes_for(400), 2);
    }

    #[test]
    fn test_reading_time_spans_sections() {
        let content = vec![section(150), section(51)];
        assert_eq!(word_count(&content), 201);
        assert_eq!(reading_time(&content), 2);
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(reading_time(&[]), 0);
        let blank = ContentSection {
            heading: String::new(),
            body: vec![Block::paragraph("   \n\t ")],
        };
        assert_eq!(word_count(&[blank]), 0);
    }

    #[test]
    fn test_irregular_whitespace() {
        let content = vec![ContentSection {
            heading: String::new(),
            body: vec![
                Block::paragraph("one\ttwo\n\nthree"),
                Block::paragraph("  four  "),
            ],
        }];
        assert_eq!(word_count(&content), 4);
    }

    #[test]
    fn test_monotonic_in_word_count() {
        let mut last = 0;
        for words in 0..1000 {
            let minutes = minutes_for(words);
            assert!(minutes >= last);
            last = minutes;
        }
    }
}
