/// Measures text against a rendering budget.
///
/// Implementations must be sub-additive over concatenation: counting two
/// strings joined together never yields more than counting them apart.
pub trait Tokenizer: Send + Sync {
    fn name(&self) -> &str;

    fn count(&self, text: &str) -> usize;
}

/// Budget in Unicode scalar values.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn name(&self) -> &str {
        "chars"
    }

    fn count(&self, text: &str) -> usize {
        text.chars().count()
    }
}

/// Whitespace-separated words; a rough stand-in for model tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
    fn name(&self) -> &str {
        "words"
    }

    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

pub fn tokenizer_for(name: &str) -> Option<Box<dyn Tokenizer>> {
    match name {
        "chars" => Some(Box::new(CharTokenizer)),
        "words" => Some(Box::new(WordTokenizer)),
        _ => None,
    }
}
