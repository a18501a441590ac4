//! Coordinate-level diffs between two geometries.
//!
//! A geometry is rendered as a sequence of tokens: its type tag, one `x,y`
//! token per coordinate, `/` between the parts of a multi-geometry and `@`
//! between the rings of a polygon. An empty ring or line part is written as
//! `EMPTY` and a polygon part without rings as `POLYGON EMPTY`, so empty
//! members survive the round trip. Two token sequences are diffed with
//! Myers' algorithm and the edit script is kept as unified-diff style hunks
//! with three tokens of context:
//!
//! ```text
//! @@ -1,3 +1,3 @@
//!  LineString
//! -0,0
//! +5,5
//!  1,1
//! ```

use std::collections::HashMap;
use std::fmt;

use geovcs_types::{Coord, Geometry, GeometryType};
use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffTag};

use crate::error::{DiffError, DiffResult};

const CONTEXT: usize = 3;
const PART_SEPARATOR: &str = "/";
const RING_SEPARATOR: &str = "@";
const EMPTY_SEQUENCE: &str = "EMPTY";
const EMPTY_POLYGON: &str = "POLYGON EMPTY";

#[derive(Clone, Debug, PartialEq, Eq)]
enum HunkLine {
    Context(String),
    Delete(String),
    Insert(String),
}

impl HunkLine {
    fn token(&self) -> &str {
        match self {
            HunkLine::Context(t) | HunkLine::Delete(t) | HunkLine::Insert(t) => t,
        }
    }

    fn in_old(&self) -> bool {
        !matches!(self, HunkLine::Insert(_))
    }

    fn in_new(&self) -> bool {
        !matches!(self, HunkLine::Delete(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Hunk {
    /// Zero-based position of the first old token covered.
    old_start: usize,
    new_start: usize,
    lines: Vec<HunkLine>,
}

impl Hunk {
    fn old_tokens(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter(|l| l.in_old()).map(HunkLine::token)
    }

    fn new_tokens(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter(|l| l.in_new()).map(HunkLine::token)
    }

    fn reversed(&self) -> Hunk {
        Hunk {
            old_start: self.new_start,
            new_start: self.old_start,
            lines: self
                .lines
                .iter()
                .map(|line| match line {
                    HunkLine::Context(t) => HunkLine::Context(t.clone()),
                    HunkLine::Delete(t) => HunkLine::Insert(t.clone()),
                    HunkLine::Insert(t) => HunkLine::Delete(t.clone()),
                })
                .collect(),
        }
    }
}

/// Edit script between the coordinate sequences of two geometries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LcsGeometryDiff {
    hunks: Vec<Hunk>,
    deleted: u64,
    inserted: u64,
    replaced: u64,
}

impl LcsGeometryDiff {
    pub fn new(old: &Geometry, new: &Geometry) -> Self {
        let old_tokens = tokenize(Some(old));
        let new_tokens = tokenize(Some(new));

        // Tokens are interned so the diff runs over integers, with no limit
        // on the number of distinct coordinates.
        let mut symbols: HashMap<&str, u32> = HashMap::new();
        let old_ids = intern(&mut symbols, &old_tokens);
        let new_ids = intern(&mut symbols, &new_tokens);

        let ops = capture_diff_slices(Algorithm::Myers, &old_ids, &new_ids);
        let hunks = group_diff_ops(ops, CONTEXT)
            .into_iter()
            .filter_map(|group| {
                let mut lines = Vec::new();
                let mut starts = None;
                for op in &group {
                    let (tag, old_range, new_range) = op.as_tag_tuple();
                    starts.get_or_insert((old_range.start, new_range.start));
                    match tag {
                        DiffTag::Equal => lines.extend(
                            old_tokens[old_range].iter().cloned().map(HunkLine::Context),
                        ),
                        DiffTag::Delete => lines.extend(
                            old_tokens[old_range].iter().cloned().map(HunkLine::Delete),
                        ),
                        DiffTag::Insert => lines.extend(
                            new_tokens[new_range].iter().cloned().map(HunkLine::Insert),
                        ),
                        DiffTag::Replace => {
                            lines.extend(old_tokens[old_range].iter().cloned().map(HunkLine::Delete));
                            lines.extend(new_tokens[new_range].iter().cloned().map(HunkLine::Insert));
                        }
                    }
                }
                starts.map(|(old_start, new_start)| Hunk {
                    old_start,
                    new_start,
                    lines,
                })
            })
            .collect();
        Self::from_hunks(hunks)
    }

    fn from_hunks(hunks: Vec<Hunk>) -> Self {
        let mut diff = Self {
            hunks,
            deleted: 0,
            inserted: 0,
            replaced: 0,
        };
        diff.count_points();
        diff
    }

    /// Tally points (tokens holding a coordinate) per run of deletions and
    /// insertions; a run with both counts its overlap as moved points.
    fn count_points(&mut self) {
        let (mut deleted, mut inserted, mut replaced) = (0, 0, 0);
        let mut flush = |d: &mut u64, i: &mut u64| {
            let moved = (*d).min(*i);
            replaced += moved;
            deleted += *d - moved;
            inserted += *i - moved;
            *d = 0;
            *i = 0;
        };
        for hunk in &self.hunks {
            let (mut d, mut i) = (0u64, 0u64);
            for line in &hunk.lines {
                match line {
                    HunkLine::Context(_) => flush(&mut d, &mut i),
                    HunkLine::Delete(t) if t.contains(',') => d += 1,
                    HunkLine::Insert(t) if t.contains(',') => i += 1,
                    _ => {}
                }
            }
            flush(&mut d, &mut i);
        }
        self.deleted = deleted;
        self.inserted = inserted;
        self.replaced = replaced;
    }

    pub fn deleted_points(&self) -> u64 {
        self.deleted
    }

    pub fn inserted_points(&self) -> u64 {
        self.inserted
    }

    pub fn replaced_points(&self) -> u64 {
        self.replaced
    }

    /// `true` when the two geometries had the same coordinate sequence.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn reversed(&self) -> Self {
        Self {
            hunks: self.hunks.iter().map(Hunk::reversed).collect(),
            deleted: self.inserted,
            inserted: self.deleted,
            replaced: self.replaced,
        }
    }

    pub fn can_be_applied_on(&self, geometry: &Geometry) -> bool {
        self.apply_tokens(&tokenize(Some(geometry))).is_some()
    }

    pub fn apply_on(&self, geometry: &Geometry) -> DiffResult<Geometry> {
        let tokens = self
            .apply_tokens(&tokenize(Some(geometry)))
            .ok_or_else(|| DiffError::CannotApply(format!("geometry diff does not match {geometry}")))?;
        untokenize(&tokens)?
            .ok_or_else(|| DiffError::CannotApply("geometry diff leaves no geometry".to_string()))
    }

    fn apply_tokens(&self, tokens: &[String]) -> Option<Vec<String>> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut pos = 0;
        for hunk in &self.hunks {
            let expected: Vec<&str> = hunk.old_tokens().collect();
            let matches_at = |start: usize| {
                start + expected.len() <= tokens.len()
                    && tokens[start..start + expected.len()]
                        .iter()
                        .zip(&expected)
                        .all(|(a, b)| a == b)
            };
            let start = if hunk.old_start >= pos && matches_at(hunk.old_start) {
                hunk.old_start
            } else {
                (pos..=tokens.len().saturating_sub(expected.len())).find(|s| matches_at(*s))?
            };
            out.extend_from_slice(&tokens[pos..start]);
            out.extend(hunk.new_tokens().map(str::to_string));
            pos = start + expected.len();
        }
        out.extend_from_slice(&tokens[pos..]);
        Some(out)
    }

    /// Unified-diff style patch text.
    pub fn patch_text(&self) -> String {
        let mut out = String::new();
        for hunk in &self.hunks {
            let old_len = hunk.old_tokens().count();
            let new_len = hunk.new_tokens().count();
            out.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                hunk.old_start + 1,
                old_len,
                hunk.new_start + 1,
                new_len
            ));
            for line in &hunk.lines {
                let prefix = match line {
                    HunkLine::Context(_) => ' ',
                    HunkLine::Delete(_) => '-',
                    HunkLine::Insert(_) => '+',
                };
                out.push(prefix);
                out.push_str(line.token());
                out.push('\n');
            }
        }
        out
    }

    /// `<deleted>/<inserted>/<replaced>\t<patch>`, newlines in the patch
    /// escaped as `\n`.
    pub fn as_text(&self) -> String {
        format!(
            "{}/{}/{}\t{}",
            self.deleted,
            self.inserted,
            self.replaced,
            self.patch_text().replace('\n', "\\n")
        )
    }

    pub fn from_text(text: &str) -> DiffResult<Self> {
        let wrong = |reason: &str| DiffError::WrongDifference(format!("{reason}: {text:?}"));
        let (counts, patch) = text.split_once('\t').ok_or_else(|| wrong("missing tab"))?;
        let counts: Vec<u64> = counts
            .split('/')
            .map(|c| c.parse::<u64>())
            .collect::<Result<_, _>>()
            .map_err(|_| wrong("bad point counts"))?;
        if counts.len() != 3 {
            return Err(wrong("expected three point counts"));
        }

        let patch = patch.replace("\\n", "\n");
        let mut hunks: Vec<Hunk> = Vec::new();
        for line in patch.lines().filter(|l| !l.is_empty()) {
            if let Some(header) = line.strip_prefix("@@ ") {
                let (old_start, new_start) = parse_hunk_header(header).ok_or_else(|| wrong("bad hunk header"))?;
                hunks.push(Hunk {
                    old_start,
                    new_start,
                    lines: Vec::new(),
                });
                continue;
            }
            let hunk = hunks.last_mut().ok_or_else(|| wrong("patch line outside a hunk"))?;
            let mut chars = line.chars();
            let prefix = chars.next();
            let token = chars.as_str().to_string();
            hunk.lines.push(match prefix {
                Some(' ') => HunkLine::Context(token),
                Some('-') => HunkLine::Delete(token),
                Some('+') => HunkLine::Insert(token),
                _ => return Err(wrong("bad patch line prefix")),
            });
        }

        let diff = Self::from_hunks(hunks);
        if [diff.deleted, diff.inserted, diff.replaced] != counts[..] {
            return Err(wrong("point counts do not match the patch"));
        }
        Ok(diff)
    }

    /// The changed stretches of the old coordinate string, deletions in
    /// `[...]` and insertions in `(...)`, hunks separated by ` ... `.
    pub fn diff_text(&self) -> String {
        self.hunks
            .iter()
            .map(|hunk| {
                hunk.lines
                    .iter()
                    .map(|line| match line {
                        HunkLine::Context(t) => t.clone(),
                        HunkLine::Delete(t) => format!("[{t}]"),
                        HunkLine::Insert(t) => format!("({t})"),
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join(" ... ")
    }
}

impl fmt::Display for LcsGeometryDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} point(s) deleted, {} new point(s) added, {} point(s) moved",
            self.deleted, self.inserted, self.replaced
        )
    }
}

fn intern<'a>(symbols: &mut HashMap<&'a str, u32>, tokens: &'a [String]) -> Vec<u32> {
    tokens
        .iter()
        .map(|t| {
            let next = symbols.len() as u32;
            *symbols.entry(t.as_str()).or_insert(next)
        })
        .collect()
}

/// `-a,b +c,d` (one-based) to zero-based `(a - 1, c - 1)`.
fn parse_hunk_header(header: &str) -> Option<(usize, usize)> {
    let mut parts = header.split_whitespace();
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    let start = |range: &str| -> Option<usize> {
        let (start, _len) = range.split_once(',')?;
        start.parse::<usize>().ok()?.checked_sub(1)
    };
    Some((start(old)?, start(new)?))
}

// ---------------------------------------------------------------------------
// Coordinate tokens
// ---------------------------------------------------------------------------

fn coord_token(c: &Coord) -> String {
    format!("{},{}", c.x, c.y)
}

fn push_coords(out: &mut Vec<String>, coords: &[Coord]) {
    out.extend(coords.iter().map(coord_token));
}

/// A ring or line part; empty ones get a marker so they are not lost
/// between separators.
fn push_sequence(out: &mut Vec<String>, coords: &[Coord]) {
    if coords.is_empty() {
        out.push(EMPTY_SEQUENCE.to_string());
    } else {
        push_coords(out, coords);
    }
}

fn push_rings(out: &mut Vec<String>, rings: &[Vec<Coord>]) {
    if rings.is_empty() {
        out.push(EMPTY_POLYGON.to_string());
    }
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            out.push(RING_SEPARATOR.to_string());
        }
        push_sequence(out, ring);
    }
}

/// Token sequence of a geometry; empty for `None`.
pub(crate) fn tokenize(geometry: Option<&Geometry>) -> Vec<String> {
    let Some(geometry) = geometry else {
        return Vec::new();
    };
    let mut out = vec![geometry.geometry_type().name().to_string()];
    match geometry {
        Geometry::Point(c) => out.push(coord_token(c)),
        Geometry::LineString(coords) => push_coords(&mut out, coords),
        Geometry::Polygon(rings) => push_rings(&mut out, rings),
        Geometry::MultiPoint(points) => {
            for (i, c) in points.iter().enumerate() {
                if i > 0 {
                    out.push(PART_SEPARATOR.to_string());
                }
                out.push(coord_token(c));
            }
        }
        Geometry::MultiLineString(lines) => {
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    out.push(PART_SEPARATOR.to_string());
                }
                push_sequence(&mut out, line);
            }
        }
        Geometry::MultiPolygon(polygons) => {
            for (i, rings) in polygons.iter().enumerate() {
                if i > 0 {
                    out.push(PART_SEPARATOR.to_string());
                }
                push_rings(&mut out, rings);
            }
        }
    }
    out
}

/// Inverse of [`tokenize`].
pub(crate) fn untokenize(tokens: &[String]) -> DiffResult<Option<Geometry>> {
    let Some((tag, rest)) = tokens.split_first() else {
        return Ok(None);
    };
    let geometry_type = GeometryType::from_name(tag)
        .ok_or_else(|| DiffError::WrongDifference(format!("unknown geometry tag {tag:?}")))?;

    let parts: Vec<&[String]> = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(|t| t == PART_SEPARATOR).collect()
    };
    let geometry = match geometry_type {
        GeometryType::Point => match parse_coords(rest)?.as_slice() {
            [c] => Geometry::Point(*c),
            _ => return Err(DiffError::WrongDifference("point needs one coordinate".into())),
        },
        GeometryType::LineString => Geometry::LineString(parse_coords(rest)?),
        GeometryType::Polygon => Geometry::Polygon(parse_rings(rest)?),
        GeometryType::MultiPoint => Geometry::MultiPoint(
            parts
                .iter()
                .map(|part| match parse_coords(part)?.as_slice() {
                    [c] => Ok(*c),
                    _ => Err(DiffError::WrongDifference("multipoint part needs one coordinate".into())),
                })
                .collect::<DiffResult<_>>()?,
        ),
        GeometryType::MultiLineString => Geometry::MultiLineString(
            parts.iter().map(|part| parse_sequence(part)).collect::<DiffResult<_>>()?,
        ),
        GeometryType::MultiPolygon => Geometry::MultiPolygon(
            parts.iter().map(|part| parse_rings(part)).collect::<DiffResult<_>>()?,
        ),
    };
    Ok(Some(geometry))
}

fn parse_rings(tokens: &[String]) -> DiffResult<Vec<Vec<Coord>>> {
    match tokens {
        [] => Ok(Vec::new()),
        [marker] if marker == EMPTY_POLYGON => Ok(Vec::new()),
        _ => tokens.split(|t| t == RING_SEPARATOR).map(parse_sequence).collect(),
    }
}

fn parse_sequence(tokens: &[String]) -> DiffResult<Vec<Coord>> {
    match tokens {
        [marker] if marker == EMPTY_SEQUENCE => Ok(Vec::new()),
        _ => parse_coords(tokens),
    }
}

fn parse_coords(tokens: &[String]) -> DiffResult<Vec<Coord>> {
    tokens
        .iter()
        .map(|token| {
            let bad = || DiffError::WrongDifference(format!("bad coordinate token {token:?}"));
            let (x, y) = token.split_once(',').ok_or_else(bad)?;
            Ok(Coord::new(
                x.parse().map_err(|_| bad())?,
                y.parse().map_err(|_| bad())?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn wkt(text: &str) -> Geometry {
        Geometry::from_wkt(text).unwrap()
    }

    // -----------------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------------

    #[test]
    fn token_layout() {
        assert_eq!(tokenize(Some(&wkt("POINT (1 2)"))), vec!["Point", "1,2"]);
        assert_eq!(
            tokenize(Some(&wkt("POLYGON ((0 0, 1 0, 0 0), (5 5, 6 5, 5 5))"))),
            vec!["Polygon", "0,0", "1,0", "0,0", "@", "5,5", "6,5", "5,5"]
        );
        assert_eq!(
            tokenize(Some(&wkt("MULTIPOINT ((1 1), (2 2))"))),
            vec!["MultiPoint", "1,1", "/", "2,2"]
        );
        assert!(tokenize(None).is_empty());
        assert_eq!(tokenize(Some(&wkt("POLYGON (EMPTY)"))), vec!["Polygon", "EMPTY"]);
        assert_eq!(
            tokenize(Some(&wkt("MULTIPOLYGON (EMPTY, ((1 1, 2 1, 1 1)))"))),
            vec!["MultiPolygon", "POLYGON EMPTY", "/", "1,1", "2,1", "1,1"]
        );
    }

    #[test]
    fn tokens_roundtrip() {
        for text in [
            "POINT (0.5 -3)",
            "LINESTRING (0 0, 1 1, 2 2)",
            "POLYGON ((0 0, 1 0, 1 1, 0 0), (0.2 0.2, 0.3 0.2, 0.2 0.2))",
            "MULTIPOINT ((1 1), (2 2))",
            "MULTILINESTRING ((0 0, 1 1), (2 2, 3 3))",
            "MULTIPOLYGON (((0 0, 1 0, 0 0)), ((5 5, 6 5, 5 5), (5.1 5.1, 5.2 5.1, 5.1 5.1)))",
            "LINESTRING EMPTY",
            "POLYGON EMPTY",
            "POLYGON (EMPTY)",
            "POLYGON ((0 0, 1 0, 0 0), EMPTY)",
            "MULTILINESTRING (EMPTY)",
            "MULTILINESTRING (EMPTY, (0 0, 1 1), EMPTY)",
            "MULTIPOLYGON (EMPTY)",
            "MULTIPOLYGON ((EMPTY))",
            "MULTIPOLYGON (((0 0, 1 0, 0 0)), EMPTY)",
            "MULTIPOLYGON EMPTY",
        ] {
            let g = wkt(text);
            assert_eq!(untokenize(&tokenize(Some(&g))).unwrap(), Some(g), "{text}");
        }
        assert_eq!(untokenize(&[]).unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Diffs
    // -----------------------------------------------------------------------

    #[test]
    fn moved_point() {
        let old = wkt("POINT (0 0)");
        let new = wkt("POINT (1 1)");
        let diff = LcsGeometryDiff::new(&old, &new);
        assert!(diff.as_text().starts_with("0/0/1\t"));
        assert_eq!(diff.as_text(), "0/0/1\t@@ -1,2 +1,2 @@\\n Point\\n-0,0\\n+1,1\\n");
        assert_eq!(diff.apply_on(&old).unwrap(), new);
        assert_eq!(diff.to_string(), "0 point(s) deleted, 0 new point(s) added, 1 point(s) moved");
        assert_eq!(diff.diff_text(), "Point [0,0] (1,1)");
    }

    #[test]
    fn added_and_removed_vertices() {
        let old = wkt("LINESTRING (0 0, 1 1, 2 2, 3 3)");
        let new = wkt("LINESTRING (0 0, 2 2, 3 3, 4 4, 5 5)");
        let diff = LcsGeometryDiff::new(&old, &new);
        assert_eq!(diff.deleted_points(), 1);
        assert_eq!(diff.inserted_points(), 2);
        assert_eq!(diff.replaced_points(), 0);
        assert_eq!(diff.apply_on(&old).unwrap(), new);
        assert_eq!(diff.reversed().apply_on(&new).unwrap(), old);
    }

    #[test]
    fn text_roundtrip() {
        let diff = LcsGeometryDiff::new(
            &wkt("POLYGON ((0 0, 10 0, 10 10, 0 10, 0 0))"),
            &wkt("POLYGON ((0 0, 10 0, 12 12, 0 10, 0 0), (1 1, 2 1, 1 1))"),
        );
        assert_eq!(LcsGeometryDiff::from_text(&diff.as_text()).unwrap(), diff);
        assert!(!diff.as_text().contains('\n'));
    }

    #[test]
    fn rejects_malformed_text() {
        for text in [
            "no tab",
            "1/2\t",
            "x/0/0\t",
            "0/0/1\t-0,0\\n",
            "0/0/1\t@@ -1,1 +1,1 @@\\n*0,0\\n",
            "5/0/0\t@@ -1,2 +1,2 @@\\n Point\\n-0,0\\n+1,1\\n",
        ] {
            assert!(
                matches!(LcsGeometryDiff::from_text(text), Err(DiffError::WrongDifference(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn does_not_apply_to_unrelated_geometry() {
        let diff = LcsGeometryDiff::new(&wkt("LINESTRING (0 0, 1 1)"), &wkt("LINESTRING (0 0, 2 2)"));
        let other = wkt("LINESTRING (7 7, 8 8)");
        assert!(!diff.can_be_applied_on(&other));
        assert!(matches!(diff.apply_on(&other), Err(DiffError::CannotApply(_))));
    }

    #[test]
    fn applies_to_shifted_geometry() {
        let diff = LcsGeometryDiff::new(
            &wkt("LINESTRING (0 0, 1 1, 2 2, 3 3, 4 4, 5 5, 6 6, 7 7, 8 8)"),
            &wkt("LINESTRING (0 0, 1 1, 2 2, 3 3, 4 4, 5 5, 6 6, 7 7, 9 9)"),
        );
        let shifted = wkt("LINESTRING (-2 -2, -1 -1, 0 0, 1 1, 2 2, 3 3, 4 4, 5 5, 6 6, 7 7, 8 8)");
        assert_eq!(
            diff.apply_on(&shifted).unwrap(),
            wkt("LINESTRING (-2 -2, -1 -1, 0 0, 1 1, 2 2, 3 3, 4 4, 5 5, 6 6, 7 7, 9 9)")
        );
    }

    #[test]
    fn equal_geometries_have_empty_diff() {
        let g = wkt("LINESTRING (0 0, 1 1)");
        let diff = LcsGeometryDiff::new(&g, &g);
        assert!(diff.is_empty());
        assert_eq!(diff.apply_on(&g).unwrap(), g);
    }

    fn coord() -> impl Strategy<Value = Coord> {
        (0i32..6, 0i32..6).prop_map(|(x, y)| Coord::new(f64::from(x), f64::from(y)))
    }

    fn sequence() -> impl Strategy<Value = Vec<Coord>> {
        prop::collection::vec(coord(), 0..5)
    }

    fn rings() -> impl Strategy<Value = Vec<Vec<Coord>>> {
        prop::collection::vec(sequence(), 0..3)
    }

    fn geometry() -> impl Strategy<Value = Geometry> {
        prop_oneof![
            coord().prop_map(Geometry::Point),
            prop::collection::vec(coord(), 0..12).prop_map(Geometry::LineString),
            rings().prop_map(Geometry::Polygon),
            prop::collection::vec(coord(), 0..6).prop_map(Geometry::MultiPoint),
            rings().prop_map(Geometry::MultiLineString),
            prop::collection::vec(rings(), 0..3).prop_map(Geometry::MultiPolygon),
        ]
    }

    proptest! {
        #[test]
        fn diff_applies_both_ways(old in geometry(), new in geometry()) {
            let diff = LcsGeometryDiff::new(&old, &new);
            prop_assert_eq!(diff.apply_on(&old).unwrap(), new.clone());
            prop_assert_eq!(diff.reversed().apply_on(&new).unwrap(), old);
            prop_assert_eq!(LcsGeometryDiff::from_text(&diff.as_text()).unwrap(), diff);
        }
    }
}
