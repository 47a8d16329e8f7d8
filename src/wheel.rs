use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

/// The first Advent of Code event.
pub const FIRST_YEAR: i32 = 2015;

/// Number of puzzle days in a year, unless listed in [`DAYS_PER_YEAR`].
pub const DEFAULT_DAYS: u32 = 25;

/// Years whose event ran for a different number of days.
pub const DAYS_PER_YEAR: &[(i32, u32)] = &[
    (2025, 12),
];

/// Suggested languages and their relative weights. Weights don’t have to
/// sum to anything; a weight of 10 is simply ten times as likely as 1.
pub const LANGUAGE_WEIGHTS: &[(&str, u32)] = &[
    ("Python", 10),
    ("Rust", 8),
    ("JavaScript", 8),
    ("TypeScript", 6),
    ("Go", 6),
    ("C++", 5),
    ("Java", 5),
    ("C", 4),
    ("C#", 4),
    ("Kotlin", 3),
    ("Haskell", 3),
    ("Ruby", 2),
    ("OCaml", 2),
    ("Zig", 2),
    ("Lua", 2),
    ("Perl", 1),
    ("Bash", 1),
    ("SQL", 1),
    ("Brainfuck", 1),
];

static LANGUAGE_DIST: Lazy<WeightedIndex<u32>> = Lazy::new(|| {
    WeightedIndex::new(LANGUAGE_WEIGHTS.iter().map(|(_, w)| *w))
        .expect("language weights must be positive")
});

/// One result of spinning the wheel. Never persisted; a fresh one is drawn
/// for every spin and every scheduled announcement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChallengeSelection {
    pub year: i32,
    pub day: u32,
    pub language: &'static str,
}

impl ChallengeSelection {
    pub fn url(&self) -> String {
        format!("https://adventofcode.com/{}/day/{}", self.year, self.day)
    }
}

/// Number of puzzle days available for a year.
pub fn days_for_year(year: i32) -> u32 {
    DAYS_PER_YEAR
        .iter()
        .find(|(y, _)| *y == year)
        .map_or(DEFAULT_DAYS, |(_, days)| *days)
}

/// Pick a random challenge: uniform year, uniform day within that year,
/// weighted language. The upper end of the year range is read from the
/// clock here rather than at startup so that a new event becomes eligible
/// without a restart.
pub fn select_challenge() -> ChallengeSelection {
    let mut rng = rand::rng();
    let year = rng.random_range(FIRST_YEAR..=Utc::now().year());
    let day = rng.random_range(1..=days_for_year(year));
    let language = LANGUAGE_WEIGHTS[LANGUAGE_DIST.sample(&mut rng)].0;
    ChallengeSelection { year, day, language }
}
