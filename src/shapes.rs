use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// Shared pieces of the three surface grammars. All patterns are compiled
// case-insensitively, so `[a-z]` covers upper case and `[x*]` covers `X`.
//
// name:   letters and spaces only, as short as possible
// weight: " at 135lbs", " with 20 kg", " @ 60kg"
// rest:   ", 90s rest", ", 60 sec rest"
const NAME: &str = r"(?P<name>[a-z][a-z ]*?)";
const WEIGHT: &str = r"(?:\s+(?:at|with|@)\s*(?P<weight>\d+(?:\.\d+)?)\s*(?:lbs?|kgs?)\b)?";
const REST: &str = r"(?:\s*,\s*(?P<rest>\d+)\s*(?:s|secs?|seconds?)\s+rest\b)?";

// "10x4 pushup", "3 * 8 bench press at 135lbs, 90s rest"
static COUNT_BY_COUNT_BODY: Lazy<String> = Lazy::new(|| {
    format!(r"(?P<first>\d+)\s*[x*]\s*(?P<second>\d+)\s+{NAME}{WEIGHT}{REST}")
});

// "10,10,8,6 pull ups", "12, 10, 8 rows with 40kg"
static REP_LIST_BODY: Lazy<String> =
    Lazy::new(|| format!(r"(?P<reps>\d+(?:\s*,\s*\d+)+)\s+{NAME}{WEIGHT}"));

// "5 sets of 10 pushups", "1 set of 20 burpees"
static WORDS_BODY: Lazy<String> = Lazy::new(|| {
    format!(r"(?P<sets>\d+)\s+sets?\s+of\s+(?P<reps>\d+)\s+{NAME}{WEIGHT}")
});

/// Anchored at the start, ending at a comma or the end of the text.
fn prefix_regex(body: &str) -> Regex {
    Regex::new(&format!(r"(?i)^\s*{body}\s*(?:,|$)")).unwrap()
}

/// Leftmost occurrence that runs to the end of the clause.
fn clause_regex(body: &str) -> Regex {
    Regex::new(&format!(r"(?i){body}\s*$")).unwrap()
}

static COUNT_BY_COUNT_PREFIX: Lazy<Regex> = Lazy::new(|| prefix_regex(&COUNT_BY_COUNT_BODY));
static COUNT_BY_COUNT_CLAUSE: Lazy<Regex> = Lazy::new(|| clause_regex(&COUNT_BY_COUNT_BODY));
static REP_LIST_PREFIX: Lazy<Regex> = Lazy::new(|| prefix_regex(&REP_LIST_BODY));
static REP_LIST_CLAUSE: Lazy<Regex> = Lazy::new(|| clause_regex(&REP_LIST_BODY));
static WORDS_PREFIX: Lazy<Regex> = Lazy::new(|| prefix_regex(&WORDS_BODY));
static WORDS_CLAUSE: Lazy<Regex> = Lazy::new(|| clause_regex(&WORDS_BODY));

/// The closed set of ways an exercise can be written down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `"<A>x<B> <name>"`; the larger number is reps, the smaller is sets.
    CountByCount,
    /// `"<r1>,<r2>,... <name>"`; one number per performed set.
    RepList,
    /// `"<N> sets of <M> <name>"`.
    Words,
}

/// A shape recognized in a piece of text, with the fields it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMatch<'a> {
    pub shape: Shape,
    /// Name exactly as typed, not yet normalized.
    pub name: &'a str,
    pub target_sets: u32,
    pub target_reps: u32,
    pub weight: Option<f64>,
    pub rest_seconds: Option<u32>,
    pub completed_reps: Option<Vec<u32>>,
    /// The substring the match covered.
    pub consumed: &'a str,
}

impl Shape {
    /// Order in which shapes are tried, both when segmenting and when parsing
    /// a single clause.
    pub const PRIORITY: [Self; 3] = [Self::CountByCount, Self::RepList, Self::Words];

    fn prefix_re(self) -> &'static Regex {
        match self {
            Self::CountByCount => &COUNT_BY_COUNT_PREFIX,
            Self::RepList => &REP_LIST_PREFIX,
            Self::Words => &WORDS_PREFIX,
        }
    }

    fn clause_re(self) -> &'static Regex {
        match self {
            Self::CountByCount => &COUNT_BY_COUNT_CLAUSE,
            Self::RepList => &REP_LIST_CLAUSE,
            Self::Words => &WORDS_CLAUSE,
        }
    }

    /// Length in bytes of the prefix of `text` this shape covers, including a
    /// trailing comma if that is where it stopped.
    ///
    /// Only a match starting at byte 0 counts.
    #[must_use]
    pub fn prefix_len(self, text: &str) -> Option<usize> {
        self.prefix_re()
            .find(text)
            .filter(|m| m.start() == 0)
            .map(|m| m.end())
    }

    /// Recognize this shape in a whole clause and pull out its fields.
    ///
    /// Returns `None` when the text does not have this shape or when one of
    /// its numbers does not fit in a `u32`.
    #[must_use]
    pub fn match_clause(self, clause: &str) -> Option<ShapeMatch<'_>> {
        let caps = self.clause_re().captures(clause)?;
        self.extract(&caps)
    }

    fn extract<'a>(self, caps: &Captures<'a>) -> Option<ShapeMatch<'a>> {
        let name = caps.name("name")?.as_str();
        let consumed = caps.get(0)?.as_str();
        let weight = caps
            .name("weight")
            .and_then(|m| m.as_str().parse::<f64>().ok());

        let (target_sets, target_reps, rest_seconds, completed_reps) = match self {
            Self::CountByCount => {
                let a = capture_u32(caps, "first")?;
                let b = capture_u32(caps, "second")?;
                let rest = caps
                    .name("rest")
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .filter(|&s| s > 0);
                (a.min(b), a.max(b), rest, None)
            }
            Self::RepList => {
                let reps = caps
                    .name("reps")?
                    .as_str()
                    .split(',')
                    .map(|n| n.trim().parse::<u32>().ok())
                    .collect::<Option<Vec<_>>>()?;
                let sets = u32::try_from(reps.len()).ok()?;
                let mean = rounded_mean(&reps)?;
                (sets, mean, None, Some(reps))
            }
            Self::Words => (
                capture_u32(caps, "sets")?,
                capture_u32(caps, "reps")?,
                None,
                None,
            ),
        };

        Some(ShapeMatch {
            shape: self,
            name,
            target_sets,
            target_reps,
            weight,
            rest_seconds,
            completed_reps,
            consumed,
        })
    }
}

fn capture_u32(caps: &Captures<'_>, group: &str) -> Option<u32> {
    caps.name(group)?.as_str().parse().ok()
}

/// Arithmetic mean rounded half up: `[10, 10, 8, 6]` gives 9.
fn rounded_mean(values: &[u32]) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    let n = u64::try_from(values.len()).ok()?;
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    u32::try_from((2 * sum + n) / (2 * n)).ok()
}
