use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the single decimal digit appended once every given-name prefix
/// has collided.
pub trait DigitSource: Send {
    /// Next digit in `0..=9`.
    fn next_digit(&mut self) -> u8;
}

/// Thread-local RNG, used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDigits;

impl DigitSource for ThreadDigits {
    fn next_digit(&mut self) -> u8 {
        rand::rng().random_range(0..10)
    }
}

/// Seeded RNG: the same seed replays the same digits.
#[derive(Debug, Clone)]
pub struct SeededDigits {
    rng: StdRng,
}

impl SeededDigits {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl DigitSource for SeededDigits {
    fn next_digit(&mut self) -> u8 {
        self.rng.random_range(0..10)
    }
}

/// Replays a fixed sequence of digits, cycling when it runs out.
#[derive(Debug, Clone)]
pub struct FixedDigits {
    digits: Vec<u8>,
    cursor: usize,
}

impl FixedDigits {
    pub fn new(digits: impl Into<Vec<u8>>) -> Self {
        Self {
            digits: digits.into(),
            cursor: 0,
        }
    }
}

impl DigitSource for FixedDigits {
    fn next_digit(&mut self) -> u8 {
        if self.digits.is_empty() {
            return 0;
        }
        let digit = self.digits[self.cursor % self.digits.len()] % 10;
        self.cursor += 1;
        digit
    }
}
