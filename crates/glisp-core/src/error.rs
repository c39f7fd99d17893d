use crate::value::Value;

#[derive(Debug, Clone, thiserror::Error)]
pub enum GlispError {
    #[error("Read error: {0}")]
    Read(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unbound identifier: {0}")]
    Unbound(String),

    #[error("Arity error: {name} expects {expected} args, got {got}")]
    Arity {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("Type error: {name} - wrong argument type {got}")]
    WrongArgumentType { name: String, got: String },

    #[error("Not applicable: {0}")]
    NotApplicable(String),

    #[error("Index out of bounds: {index} (length {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Malformed list: {0}")]
    MalformedList(String),

    #[error("Eval error: {0}")]
    Eval(String),

    #[error("{inner}")]
    WithContext {
        inner: Box<GlispError>,
        hint: Option<String>,
    },
}

/// Compute the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == *cb { 0 } else { 1 };
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Find the most similar name from a list of candidates.
/// Returns `None` if no candidate is close enough.
pub fn suggest_similar(name: &str, candidates: &[String]) -> Option<String> {
    // Roughly a third of the name, between 1 and 3 edits.
    let threshold = (name.chars().count() / 3).clamp(1, 3);

    candidates
        .iter()
        .filter(|c| !c.starts_with("__temp_"))
        .filter_map(|c| {
            let d = edit_distance(name, c);
            if d > 0 && d <= threshold {
                Some((c, d))
            } else {
                None
            }
        })
        .min_by(|(a, da), (b, db)| da.cmp(db).then_with(|| a.cmp(b)))
        .map(|(name, _)| name.clone())
}

/// Targeted hints for names that other Lisp dialects spell differently.
pub fn veteran_hint(name: &str) -> Option<&'static str> {
    match name {
        "lambda" => Some("glisp spells anonymous functions 'fn': (fn (x) body)"),
        "define" | "defun" | "defn" => {
            Some("glisp uses 'def': (def name expr) or (def (name params...) body)")
        }
        "begin" | "progn" => Some("glisp uses 'do' to sequence expressions"),
        "car" | "first" => Some("glisp uses 'head' for the first element of a list"),
        "cdr" | "rest" => Some("glisp uses 'tail' for the rest of a list"),
        "set!" | "setq" | "setf" => {
            Some("glisp has no assignment; use a ref: (def r (ref 0)) then (r 10)")
        }
        "null?" => Some("glisp uses 'empty?' for the empty list and 'nil?' for #nil"),
        "vector" | "make-vector" => Some("glisp uses 'array'; read with (a i), write with (a i v)"),
        "hash-map" | "make-hash-table" => {
            Some("glisp uses 'dict': (dict '(a 1) '(b 2)); read with (d 'a)")
        }
        "loop" | "while" => Some("glisp loops with tail recursion through 'letrec' or named 'fn'"),
        _ => None,
    }
}

impl GlispError {
    pub fn read(msg: impl Into<String>) -> Self {
        GlispError::Read(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        GlispError::Parse(msg.into())
    }

    pub fn eval(msg: impl Into<String>) -> Self {
        GlispError::Eval(msg.into())
    }

    pub fn arity(name: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        GlispError::Arity {
            name: name.into(),
            expected: expected.into(),
            got,
        }
    }

    /// A primitive received a value of the wrong kind; carries its type tag.
    pub fn wrong_type(name: impl Into<String>, value: &Value) -> Self {
        GlispError::WrongArgumentType {
            name: name.into(),
            got: value.type_name().to_string(),
        }
    }

    pub fn malformed_list(name: impl Into<String>) -> Self {
        GlispError::MalformedList(name.into())
    }

    /// Attach a hint (actionable suggestion) to this error.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        match self {
            GlispError::WithContext { inner, .. } => GlispError::WithContext {
                inner,
                hint: Some(hint.into()),
            },
            other => GlispError::WithContext {
                inner: Box::new(other),
                hint: Some(hint.into()),
            },
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            GlispError::WithContext { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    pub fn inner(&self) -> &GlispError {
        match self {
            GlispError::WithContext { inner, .. } => inner.inner(),
            other => other,
        }
    }
}
