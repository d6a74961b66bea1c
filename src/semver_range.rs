//! npm-style version range parsing, satisfaction checks, and intersection.
//!
//! This is the algorithmic core the request coalescer, satisfaction filter,
//! hoist planner, and symlink repair all share: deciding whether a version
//! satisfies a range, and whether two ranges can be merged into one tighter
//! range. Exact version parsing/validity delegates to `deno_semver`; the
//! range-comparator and interval arithmetic below is first-party.

use deno_semver::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SimpleVersion {
  major: u64,
  minor: u64,
  patch: u64,
}

impl SimpleVersion {
  fn new(major: u64, minor: u64, patch: u64) -> Self {
    Self { major, minor, patch }
  }
}

impl std::fmt::Display for SimpleVersion {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
  }
}

#[derive(Debug, Clone, Copy)]
struct Bound {
  value: SimpleVersion,
  inclusive: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Interval {
  lower: Option<Bound>,
  upper: Option<Bound>,
}

impl Interval {
  fn unbounded() -> Self {
    Self { lower: None, upper: None }
  }

  fn contains(&self, v: SimpleVersion) -> bool {
    let lower_ok = match self.lower {
      None => true,
      Some(b) => if b.inclusive { v >= b.value } else { v > b.value },
    };
    let upper_ok = match self.upper {
      None => true,
      Some(b) => if b.inclusive { v <= b.value } else { v < b.value },
    };
    lower_ok && upper_ok
  }

  fn intersect(&self, other: &Interval) -> Option<Interval> {
    let lower = tighter_lower(self.lower, other.lower);
    let upper = tighter_upper(self.upper, other.upper);
    if let (Some(lo), Some(hi)) = (lower, upper) {
      let empty = if lo.inclusive && hi.inclusive {
        lo.value > hi.value
      } else {
        lo.value >= hi.value
      };
      if empty {
        return None;
      }
    }
    Some(Interval { lower, upper })
  }

  fn to_range_string(&self) -> String {
    match (self.lower, self.upper) {
      (None, None) => "*".to_string(),
      (Some(lo), Some(hi)) if lo.inclusive && hi.inclusive && lo.value == hi.value => {
        lo.value.to_string()
      }
      (Some(lo), None) => format!("{}{}", if lo.inclusive { ">=" } else { ">" }, lo.value),
      (None, Some(hi)) => format!("{}{}", if hi.inclusive { "<=" } else { "<" }, hi.value),
      (Some(lo), Some(hi)) => format!(
        "{}{} {}{}",
        if lo.inclusive { ">=" } else { ">" },
        lo.value,
        if hi.inclusive { "<=" } else { "<" },
        hi.value
      ),
    }
  }
}

fn tighter_lower(a: Option<Bound>, b: Option<Bound>) -> Option<Bound> {
  match (a, b) {
    (None, x) => x,
    (x, None) => x,
    (Some(a), Some(b)) => Some(match a.value.cmp(&b.value) {
      std::cmp::Ordering::Greater => a,
      std::cmp::Ordering::Less => b,
      std::cmp::Ordering::Equal => if a.inclusive && b.inclusive { a } else { Bound { value: a.value, inclusive: false } },
    }),
  }
}

fn tighter_upper(a: Option<Bound>, b: Option<Bound>) -> Option<Bound> {
  match (a, b) {
    (None, x) => x,
    (x, None) => x,
    (Some(a), Some(b)) => Some(match a.value.cmp(&b.value) {
      std::cmp::Ordering::Less => a,
      std::cmp::Ordering::Greater => b,
      std::cmp::Ordering::Equal => if a.inclusive && b.inclusive { a } else { Bound { value: a.value, inclusive: false } },
    }),
  }
}

/// A partial version token like `1`, `1.2`, `1.2.3`, `1.2.x`, `*`.
struct Partial {
  major: Option<u64>,
  minor: Option<u64>,
  patch: Option<u64>,
}

fn parse_partial(token: &str) -> Option<Partial> {
  if token.is_empty() || token == "*" || token.eq_ignore_ascii_case("x") {
    return Some(Partial { major: None, minor: None, patch: None });
  }
  let mut parts = token.split('.');
  let parse_component = |s: Option<&str>| -> Option<Option<u64>> {
    match s {
      None => Some(None),
      Some(s) if s.is_empty() || s.eq_ignore_ascii_case("x") || s == "*" => Some(None),
      Some(s) => s.parse::<u64>().ok().map(Some),
    }
  };
  let major = parse_component(parts.next())?;
  let minor = parse_component(parts.next())?;
  // a prerelease/build tag after patch (e.g. 1.2.3-beta.1) is stripped for
  // our purposes: hoisting only reasons about release precedence.
  let patch = match parts.next() {
    None => None,
    Some(s) => {
      let core = s.split(['-', '+']).next().unwrap_or(s);
      parse_component(Some(core))?
    }
  };
  Some(Partial { major, minor, patch })
}

fn x_range_interval(p: &Partial) -> Interval {
  match (p.major, p.minor, p.patch) {
    (None, _, _) => Interval::unbounded(),
    (Some(maj), None, _) => Interval {
      lower: Some(Bound { value: SimpleVersion::new(maj, 0, 0), inclusive: true }),
      upper: Some(Bound { value: SimpleVersion::new(maj + 1, 0, 0), inclusive: false }),
    },
    (Some(maj), Some(min), None) => Interval {
      lower: Some(Bound { value: SimpleVersion::new(maj, min, 0), inclusive: true }),
      upper: Some(Bound { value: SimpleVersion::new(maj, min + 1, 0), inclusive: false }),
    },
    (Some(maj), Some(min), Some(pat)) => {
      let v = SimpleVersion::new(maj, min, pat);
      Interval {
        lower: Some(Bound { value: v, inclusive: true }),
        upper: Some(Bound { value: v, inclusive: true }),
      }
    }
  }
}

fn caret_interval(p: &Partial) -> Interval {
  let maj = p.major.unwrap_or(0);
  let min = p.minor;
  let pat = p.patch;
  let lower = SimpleVersion::new(maj, min.unwrap_or(0), pat.unwrap_or(0));
  let upper = if maj > 0 {
    SimpleVersion::new(maj + 1, 0, 0)
  } else if min.is_none() {
    SimpleVersion::new(1, 0, 0)
  } else if min.unwrap_or(0) > 0 {
    SimpleVersion::new(0, min.unwrap() + 1, 0)
  } else if pat.is_none() {
    SimpleVersion::new(0, 1, 0)
  } else {
    SimpleVersion::new(0, 0, pat.unwrap() + 1)
  };
  Interval {
    lower: Some(Bound { value: lower, inclusive: true }),
    upper: Some(Bound { value: upper, inclusive: false }),
  }
}

fn tilde_interval(p: &Partial) -> Interval {
  let maj = p.major.unwrap_or(0);
  let min = p.minor;
  let pat = p.patch;
  let lower = SimpleVersion::new(maj, min.unwrap_or(0), pat.unwrap_or(0));
  let upper = if min.is_none() {
    SimpleVersion::new(maj + 1, 0, 0)
  } else {
    SimpleVersion::new(maj, min.unwrap() + 1, 0)
  };
  Interval {
    lower: Some(Bound { value: lower, inclusive: true }),
    upper: Some(Bound { value: upper, inclusive: false }),
  }
}

fn comparator_interval(token: &str) -> Option<Interval> {
  let (op, rest) = if let Some(r) = token.strip_prefix(">=") {
    (">=", r)
  } else if let Some(r) = token.strip_prefix("<=") {
    ("<=", r)
  } else if let Some(r) = token.strip_prefix('>') {
    (">", r)
  } else if let Some(r) = token.strip_prefix('<') {
    ("<", r)
  } else if let Some(r) = token.strip_prefix('=') {
    ("=", r)
  } else if let Some(r) = token.strip_prefix('^') {
    let p = parse_partial(r)?;
    return Some(caret_interval(&p));
  } else if let Some(r) = token.strip_prefix('~') {
    let p = parse_partial(r)?;
    return Some(tilde_interval(&p));
  } else {
    let p = parse_partial(token)?;
    return Some(x_range_interval(&p));
  };
  let p = parse_partial(rest)?;
  match op {
    "=" => Some(x_range_interval(&p)),
    ">=" => {
      let v = SimpleVersion::new(p.major?, p.minor.unwrap_or(0), p.patch.unwrap_or(0));
      Some(Interval { lower: Some(Bound { value: v, inclusive: true }), upper: None })
    }
    ">" => {
      // `>1.2` means "above the whole 1.2.x range", i.e. exclusive of its
      // upper edge, not merely exclusive of 1.2.0.
      let edge = x_range_interval(&p);
      let v = edge.upper.map(|b| b.value).unwrap_or(SimpleVersion::new(p.major?, 0, 0));
      let inclusive = p.minor.is_some() && p.patch.is_some();
      if inclusive {
        Some(Interval {
          lower: Some(Bound { value: SimpleVersion::new(p.major?, p.minor.unwrap(), p.patch.unwrap()), inclusive: false }),
          upper: None,
        })
      } else {
        Some(Interval { lower: Some(Bound { value: v, inclusive: true }), upper: None })
      }
    }
    "<=" => {
      let edge = x_range_interval(&p);
      let inclusive_exact = p.minor.is_some() && p.patch.is_some();
      if inclusive_exact {
        let v = SimpleVersion::new(p.major?, p.minor.unwrap(), p.patch.unwrap());
        Some(Interval { lower: None, upper: Some(Bound { value: v, inclusive: true }) })
      } else {
        let v = edge.upper.map(|b| b.value)?;
        Some(Interval { lower: None, upper: Some(Bound { value: v, inclusive: false }) })
      }
    }
    "<" => {
      let v = SimpleVersion::new(p.major?, p.minor.unwrap_or(0), p.patch.unwrap_or(0));
      Some(Interval { lower: None, upper: Some(Bound { value: v, inclusive: false }) })
    }
    _ => None,
  }
}

fn parse_comparator_set(set: &str) -> Option<Interval> {
  let set = set.trim();
  if set.is_empty() {
    return Some(Interval::unbounded());
  }
  if let Some((lo, hi)) = set.split_once(" - ") {
    let lo = parse_partial(lo.trim())?;
    let hi = parse_partial(hi.trim())?;
    let lower = SimpleVersion::new(lo.major?, lo.minor.unwrap_or(0), lo.patch.unwrap_or(0));
    let hi_edge = x_range_interval(&hi);
    let upper = if hi.minor.is_some() && hi.patch.is_some() {
      Bound { value: SimpleVersion::new(hi.major?, hi.minor.unwrap(), hi.patch.unwrap()), inclusive: true }
    } else {
      Bound { value: hi_edge.upper?.value, inclusive: false }
    };
    return Some(Interval { lower: Some(Bound { value: lower, inclusive: true }), upper: Some(upper) });
  }
  let mut result = Interval::unbounded();
  for token in set.split_whitespace() {
    let next = comparator_interval(token)?;
    result = result.intersect(&next)?;
  }
  Some(result)
}

/// A parsed npm-style version range: an OR of comparator sets.
struct ParsedRange {
  alternatives: Vec<Interval>,
}

fn parse_range(range: &str) -> Option<ParsedRange> {
  let range = range.trim();
  if range.is_empty() {
    return Some(ParsedRange { alternatives: vec![Interval::unbounded()] });
  }
  let mut alternatives = Vec::new();
  for alt in range.split("||") {
    alternatives.push(parse_comparator_set(alt)?);
  }
  Some(ParsedRange { alternatives })
}

/// Whether `range` parses as an npm-style semver range at all (including
/// tags-with-no-`||` and exact pins). Git URLs, local paths, and dist-tags
/// like `latest` are not valid ranges.
pub fn is_valid_range(range: &str) -> bool {
  parse_range(range).is_some()
}

/// Whether `version` satisfies `range`. Unparseable input on either side is
/// never a match.
pub fn satisfies(version: &str, range: &str) -> bool {
  let Some(v) = parse_exact_version(version) else { return false };
  let Some(parsed) = parse_range(range) else { return false };
  parsed.alternatives.iter().any(|i| i.contains(v))
}

fn parse_exact_version(version: &str) -> Option<SimpleVersion> {
  // Prefer the ecosystem semver parser for strict validation; fall back to
  // our own lenient partial parser for the versions real-world manifests
  // sometimes carry (missing patch, `v`-prefixed, etc).
  let trimmed = version.trim().trim_start_matches('v');
  if let Ok(parsed) = Version::parse_standard(trimmed) {
    return Some(SimpleVersion::new(parsed.major, parsed.minor, parsed.patch));
  }
  let p = parse_partial(trimmed)?;
  Some(SimpleVersion::new(p.major?, p.minor.unwrap_or(0), p.patch.unwrap_or(0)))
}

/// Intersects two ranges, returning the tightened range string when the
/// intersection is non-empty. Returns `None` when either range fails to
/// parse, either range is an OR of comparator sets (`||`), or the
/// intersection is empty -- all three are "no intersection" per the
/// coalescing rule, never an error.
pub fn intersect(a: &str, b: &str) -> Option<String> {
  let pa = parse_range(a)?;
  let pb = parse_range(b)?;
  if pa.alternatives.len() != 1 || pb.alternatives.len() != 1 {
    return None;
  }
  let merged = pa.alternatives[0].intersect(&pb.alternatives[0])?;
  Some(merged.to_range_string())
}
