//! Planar geometries and their WKT text form.
//!
//! Only the six simple-feature types are modelled. Coordinates are 2D;
//! the WKT writer uses the shortest `f64` representation that round-trips,
//! so `Geometry::from_wkt(&g.to_wkt()) == g` for every finite geometry.

use std::fmt;
use std::str::FromStr;

use crate::envelope::Envelope;
use crate::error::TypeError;

/// A 2D coordinate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Discriminant of a [`Geometry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryType {
    pub const ALL: [GeometryType; 6] = [
        GeometryType::Point,
        GeometryType::LineString,
        GeometryType::Polygon,
        GeometryType::MultiPoint,
        GeometryType::MultiLineString,
        GeometryType::MultiPolygon,
    ];

    /// Camel-case name, e.g. `"MultiPolygon"`.
    pub fn name(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
        }
    }

    /// Case-insensitive lookup by name or WKT tag.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A simple-feature geometry.
///
/// Polygons are lists of rings, exterior ring first.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Vec<Coord>>),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<Vec<Coord>>),
    MultiPolygon(Vec<Vec<Vec<Coord>>>),
}

impl Geometry {
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Coord::new(x, y))
    }

    pub fn line_string(coords: &[(f64, f64)]) -> Self {
        Geometry::LineString(coords.iter().map(|&(x, y)| Coord::new(x, y)).collect())
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) => GeometryType::LineString,
            Geometry::Polygon(_) => GeometryType::Polygon,
            Geometry::MultiPoint(_) => GeometryType::MultiPoint,
            Geometry::MultiLineString(_) => GeometryType::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
        }
    }

    /// All coordinates in storage order.
    pub fn coords(&self) -> Vec<Coord> {
        match self {
            Geometry::Point(c) => vec![*c],
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => cs.clone(),
            Geometry::Polygon(rings) | Geometry::MultiLineString(rings) => {
                rings.iter().flatten().copied().collect()
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().copied().collect(),
        }
    }

    pub fn num_points(&self) -> usize {
        self.coords().len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_points() == 0
    }

    /// Bounding box, `None` for empty geometries.
    pub fn envelope(&self) -> Option<Envelope> {
        self.coords().iter().fold(None, |acc, c| {
            Some(Envelope::merge(acc, &Envelope::of_point(c.x, c.y)))
        })
    }

    pub fn to_wkt(&self) -> String {
        self.to_string()
    }

    pub fn from_wkt(text: &str) -> Result<Self, TypeError> {
        WktParser::new(text).parse()
    }
}

// ---------------------------------------------------------------------------
// WKT writer
// ---------------------------------------------------------------------------

fn write_coord(f: &mut fmt::Formatter<'_>, c: &Coord) -> fmt::Result {
    write!(f, "{} {}", c.x, c.y)
}

fn write_seq(f: &mut fmt::Formatter<'_>, coords: &[Coord]) -> fmt::Result {
    if coords.is_empty() {
        return f.write_str("EMPTY");
    }
    f.write_str("(")?;
    for (i, c) in coords.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_coord(f, c)?;
    }
    f.write_str(")")
}

fn write_rings(f: &mut fmt::Formatter<'_>, rings: &[Vec<Coord>]) -> fmt::Result {
    if rings.is_empty() {
        return f.write_str("EMPTY");
    }
    f.write_str("(")?;
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_seq(f, ring)?;
    }
    f.write_str(")")
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Point(c) => {
                f.write_str("POINT (")?;
                write_coord(f, c)?;
                f.write_str(")")
            }
            Geometry::LineString(cs) => {
                f.write_str("LINESTRING ")?;
                write_seq(f, cs)
            }
            Geometry::Polygon(rings) => {
                f.write_str("POLYGON ")?;
                write_rings(f, rings)
            }
            Geometry::MultiPoint(cs) => {
                f.write_str("MULTIPOINT ")?;
                if cs.is_empty() {
                    return f.write_str("EMPTY");
                }
                f.write_str("(")?;
                for (i, c) in cs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("(")?;
                    write_coord(f, c)?;
                    f.write_str(")")?;
                }
                f.write_str(")")
            }
            Geometry::MultiLineString(lines) => {
                f.write_str("MULTILINESTRING ")?;
                write_rings(f, lines)
            }
            Geometry::MultiPolygon(polys) => {
                f.write_str("MULTIPOLYGON ")?;
                if polys.is_empty() {
                    return f.write_str("EMPTY");
                }
                f.write_str("(")?;
                for (i, rings) in polys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_rings(f, rings)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for Geometry {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Geometry::from_wkt(s)
    }
}

// ---------------------------------------------------------------------------
// WKT parser
// ---------------------------------------------------------------------------

struct WktParser<'a> {
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> WktParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            text,
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Geometry, TypeError> {
        let tag = self.word()?;
        let geometry_type = GeometryType::from_name(&tag)
            .ok_or_else(|| self.error(format!("unknown geometry type {tag}")))?;
        let geometry = match geometry_type {
            GeometryType::Point => {
                if self.empty_keyword() {
                    return Err(self.error("empty points are not supported"));
                }
                self.expect(b'(')?;
                let c = self.coord()?;
                self.expect(b')')?;
                Geometry::Point(c)
            }
            GeometryType::LineString => Geometry::LineString(self.coord_seq()?),
            GeometryType::Polygon => Geometry::Polygon(self.ring_seq()?),
            GeometryType::MultiPoint => Geometry::MultiPoint(self.multi_point()?),
            GeometryType::MultiLineString => Geometry::MultiLineString(self.ring_seq()?),
            GeometryType::MultiPolygon => Geometry::MultiPolygon(self.polygon_seq()?),
        };
        self.skip_ws();
        if self.pos != self.bytes.len() {
            return Err(self.error("trailing characters"));
        }
        Ok(geometry)
    }

    fn error(&self, reason: impl Into<String>) -> TypeError {
        TypeError::InvalidWkt {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, ch: u8) -> Result<(), TypeError> {
        if self.peek() == Some(ch) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", ch as char)))
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.bytes.len() && pred(self.bytes[self.pos]) {
            self.pos += 1;
        }
        &self.text[start..self.pos]
    }

    fn word(&mut self) -> Result<String, TypeError> {
        let word = self.take_while(|b| b.is_ascii_alphabetic());
        if word.is_empty() {
            return Err(self.error("expected a keyword"));
        }
        Ok(word.to_ascii_uppercase())
    }

    /// Consumes `EMPTY` if it is next.
    fn empty_keyword(&mut self) -> bool {
        let saved = self.pos;
        match self.word() {
            Ok(word) if word == "EMPTY" => true,
            _ => {
                self.pos = saved;
                false
            }
        }
    }

    fn number(&mut self) -> Result<f64, TypeError> {
        let lexeme = self.take_while(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
        lexeme
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid number {lexeme:?}")))
    }

    fn coord(&mut self) -> Result<Coord, TypeError> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Coord::new(x, y))
    }

    fn list<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, TypeError>,
    ) -> Result<Vec<T>, TypeError> {
        if self.empty_keyword() {
            return Ok(Vec::new());
        }
        self.expect(b'(')?;
        let mut items = vec![item(self)?];
        while self.peek() == Some(b',') {
            self.pos += 1;
            items.push(item(self)?);
        }
        self.expect(b')')?;
        Ok(items)
    }

    fn coord_seq(&mut self) -> Result<Vec<Coord>, TypeError> {
        self.list(Self::coord)
    }

    fn ring_seq(&mut self) -> Result<Vec<Vec<Coord>>, TypeError> {
        self.list(Self::coord_seq)
    }

    fn polygon_seq(&mut self) -> Result<Vec<Vec<Vec<Coord>>>, TypeError> {
        self.list(Self::ring_seq)
    }

    /// Accepts both `MULTIPOINT ((0 0), (1 1))` and `MULTIPOINT (0 0, 1 1)`.
    fn multi_point(&mut self) -> Result<Vec<Coord>, TypeError> {
        self.list(|p| {
            if p.peek() == Some(b'(') {
                p.pos += 1;
                let c = p.coord()?;
                p.expect(b')')?;
                Ok(c)
            } else {
                p.coord()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // -----------------------------------------------------------------------
    // Writer
    // -----------------------------------------------------------------------

    #[test]
    fn writes_point_with_shortest_numbers() {
        assert_eq!(Geometry::point(0.0, 0.0).to_wkt(), "POINT (0 0)");
        assert_eq!(Geometry::point(1.5, -2.25).to_wkt(), "POINT (1.5 -2.25)");
    }

    #[test]
    fn writes_nested_types() {
        let poly = Geometry::Polygon(vec![
            vec![
                Coord::new(0.0, 0.0),
                Coord::new(1.0, 0.0),
                Coord::new(1.0, 1.0),
                Coord::new(0.0, 0.0),
            ],
            vec![],
        ]);
        assert_eq!(poly.to_wkt(), "POLYGON ((0 0, 1 0, 1 1, 0 0), EMPTY)");

        let mp = Geometry::MultiPoint(vec![Coord::new(1.0, 2.0), Coord::new(3.0, 4.0)]);
        assert_eq!(mp.to_wkt(), "MULTIPOINT ((1 2), (3 4))");
        assert_eq!(Geometry::LineString(vec![]).to_wkt(), "LINESTRING EMPTY");
    }

    // -----------------------------------------------------------------------
    // Parser
    // -----------------------------------------------------------------------

    #[test]
    fn parses_case_insensitive_tags_and_whitespace() {
        let g = Geometry::from_wkt("  linestring( 0 0 ,1  1 )  ").unwrap();
        assert_eq!(g, Geometry::line_string(&[(0.0, 0.0), (1.0, 1.0)]));
    }

    #[test]
    fn parses_bare_multipoint_form() {
        let g: Geometry = "MULTIPOINT (1 2, 3 4)".parse().unwrap();
        assert_eq!(
            g,
            Geometry::MultiPoint(vec![Coord::new(1.0, 2.0), Coord::new(3.0, 4.0)])
        );
    }

    #[test]
    fn parses_multipolygon() {
        let g = Geometry::from_wkt("MULTIPOLYGON (((0 0, 1 0, 0 1, 0 0)), EMPTY)").unwrap();
        match g {
            Geometry::MultiPolygon(polys) => {
                assert_eq!(polys.len(), 2);
                assert_eq!(polys[0][0].len(), 4);
                assert!(polys[1].is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(Geometry::from_wkt("POINT EMPTY").is_err());
        assert!(Geometry::from_wkt("CIRCLE (0 0)").is_err());
        assert!(Geometry::from_wkt("POINT (0 0) extra").is_err());
        assert!(Geometry::from_wkt("LINESTRING (0 0, 1)").is_err());
    }

    #[test]
    fn envelope_covers_all_coordinates() {
        let g = Geometry::line_string(&[(0.0, 5.0), (-2.0, 1.0), (3.0, 2.0)]);
        assert_eq!(g.envelope(), Some(Envelope::new(-2.0, 1.0, 3.0, 5.0)));
        assert_eq!(Geometry::LineString(vec![]).envelope(), None);
    }

    // -----------------------------------------------------------------------
    // Round trip
    // -----------------------------------------------------------------------

    fn coord_strategy() -> impl Strategy<Value = Coord> {
        (-1.0e6f64..1.0e6, -1.0e6f64..1.0e6).prop_map(|(x, y)| Coord::new(x, y))
    }

    fn seq_strategy() -> impl Strategy<Value = Vec<Coord>> {
        prop::collection::vec(coord_strategy(), 1..6)
    }

    fn rings_strategy() -> impl Strategy<Value = Vec<Vec<Coord>>> {
        prop::collection::vec(seq_strategy(), 1..3)
    }

    fn geometry_strategy() -> impl Strategy<Value = Geometry> {
        prop_oneof![
            coord_strategy().prop_map(Geometry::Point),
            seq_strategy().prop_map(Geometry::LineString),
            rings_strategy().prop_map(Geometry::Polygon),
            seq_strategy().prop_map(Geometry::MultiPoint),
            rings_strategy().prop_map(Geometry::MultiLineString),
            prop::collection::vec(rings_strategy(), 1..3).prop_map(Geometry::MultiPolygon),
        ]
    }

    proptest! {
        #[test]
        fn wkt_roundtrip(g in geometry_strategy()) {
            let parsed = Geometry::from_wkt(&g.to_wkt()).unwrap();
            prop_assert_eq!(parsed, g);
        }
    }
}
