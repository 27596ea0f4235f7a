use crate::models::Flashcard;

/// An ordered batch of cards with a cursor and a flip flag.
#[derive(Debug, Clone, Default)]
pub struct FlashcardDeck {
    cards: Vec<Flashcard>,
    index: usize,
    flipped: bool,
}

impl FlashcardDeck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the batch. The cursor and flip flag start over.
    pub fn load(&mut self, cards: Vec<Flashcard>) {
        self.cards = cards;
        self.index = 0;
        self.flipped = false;
    }

    pub fn clear(&mut self) {
        self.load(Vec::new());
    }

    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.cards.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Text on the visible face of the current card.
    pub fn face(&self) -> Option<&str> {
        self.current().map(|card| {
            if self.flipped {
                card.answer.as_str()
            } else {
                card.question.as_str()
            }
        })
    }

    /// "Card 3 of 5", 1-based.
    pub fn position(&self) -> Option<(usize, usize)> {
        if self.cards.is_empty() {
            None
        } else {
            Some((self.index + 1, self.cards.len()))
        }
    }

    pub fn next(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        self.index = (self.index + 1) % self.cards.len();
        self.flipped = false;
    }

    pub fn previous(&mut self) {
        if self.cards.is_empty() {
            return;
        }
        let len = self.cards.len();
        self.index = (self.index + len - 1) % len;
        self.flipped = false;
    }

    pub fn flip(&mut self) {
        if !self.cards.is_empty() {
            self.flipped = !self.flipped;
        }
    }
}
