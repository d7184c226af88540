//! Intraday day records.
//!
//! Source data arrives in two shapes: flat (`t,o,h,l,c,v,cnt`) and aliased
//! (`time,open,high,low,close,volume,count`). The shape is decided once per
//! record by [`RecordShape::detect`]; field lookups then try the detected
//! shape's name first and the other shape's name second.

use serde::Serialize;
use serde_json::{Map, Value};

/// A normalized intraday sample.
///
/// Numeric fields are always `f64`. Input that cannot be coerced to a number
/// is stored as `NaN` rather than rejected.
#[derive(Debug, Clone, Serialize)]
pub struct DayRecord {
    pub t: String,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
    pub cnt: f64,
}

impl DayRecord {
    /// `HH:MM` prefix of the timestamp, or `""` for an empty timestamp.
    pub fn minute_key(&self) -> &str {
        match self.t.char_indices().nth(5) {
            Some((idx, _)) => &self.t[..idx],
            None => &self.t,
        }
    }

    /// Field-wise equality that treats two `NaN`s as equal.
    pub fn same_as(&self, other: &DayRecord) -> bool {
        fn eq(a: f64, b: f64) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }
        self.t == other.t
            && eq(self.o, other.o)
            && eq(self.h, other.h)
            && eq(self.l, other.l)
            && eq(self.c, other.c)
            && eq(self.v, other.v)
            && eq(self.cnt, other.cnt)
    }
}

/// One of the record's seven fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Time,
    Open,
    High,
    Low,
    Close,
    Volume,
    Count,
}

/// Which naming convention a raw record uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    /// `{t,o,h,l,c,v,cnt}`
    Flat,
    /// `{time,open,high,low,close,volume,count}`
    Aliased,
}

impl RecordShape {
    /// Pick the shape by majority of recognised keys; ties go to `Flat`.
    pub fn detect(obj: &Map<String, Value>) -> Self {
        let count = |shape: RecordShape| {
            Field::ALL
                .iter()
                .filter(|f| obj.contains_key(shape.name(**f)))
                .count()
        };
        if count(RecordShape::Aliased) > count(RecordShape::Flat) {
            RecordShape::Aliased
        } else {
            RecordShape::Flat
        }
    }

    pub fn name(self, field: Field) -> &'static str {
        match (self, field) {
            (RecordShape::Flat, Field::Time) => "t",
            (RecordShape::Flat, Field::Open) => "o",
            (RecordShape::Flat, Field::High) => "h",
            (RecordShape::Flat, Field::Low) => "l",
            (RecordShape::Flat, Field::Close) => "c",
            (RecordShape::Flat, Field::Volume) => "v",
            (RecordShape::Flat, Field::Count) => "cnt",
            (RecordShape::Aliased, Field::Time) => "time",
            (RecordShape::Aliased, Field::Open) => "open",
            (RecordShape::Aliased, Field::High) => "high",
            (RecordShape::Aliased, Field::Low) => "low",
            (RecordShape::Aliased, Field::Close) => "close",
            (RecordShape::Aliased, Field::Volume) => "volume",
            (RecordShape::Aliased, Field::Count) => "count",
        }
    }

    pub fn other(self) -> Self {
        match self {
            RecordShape::Flat => RecordShape::Aliased,
            RecordShape::Aliased => RecordShape::Flat,
        }
    }
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Time,
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::Volume,
        Field::Count,
    ];
}

/// A raw record viewed through its detected shape.
pub struct RawDayRecord<'a> {
    obj: &'a Map<String, Value>,
    shape: RecordShape,
}

impl<'a> RawDayRecord<'a> {
    pub fn new(obj: &'a Map<String, Value>) -> Self {
        Self {
            obj,
            shape: RecordShape::detect(obj),
        }
    }

    pub fn shape(&self) -> RecordShape {
        self.shape
    }

    /// Look up a field under the primary name, falling back to the alternate
    /// name when the primary is absent or `null`.
    fn lookup(&self, field: Field) -> Option<&'a Value> {
        match self.obj.get(self.shape.name(field)) {
            Some(Value::Null) | None => self.obj.get(self.shape.other().name(field)),
            found => found,
        }
    }

    fn time(&self) -> String {
        let primary = self.obj.get(self.shape.name(Field::Time));
        let alternate = self.obj.get(self.shape.other().name(Field::Time));
        // An empty or non-string primary timestamp falls through to the alternate.
        [primary, alternate]
            .into_iter()
            .flatten()
            .find_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn number(&self, field: Field) -> f64 {
        match self.lookup(field) {
            None => f64::NAN,
            Some(value) => coerce_number(value),
        }
    }

    pub fn normalize(&self) -> DayRecord {
        DayRecord {
            t: self.time(),
            o: self.number(Field::Open),
            h: self.number(Field::High),
            l: self.number(Field::Low),
            c: self.number(Field::Close),
            v: self.number(Field::Volume),
            cnt: self.number(Field::Count),
        }
    }
}

/// Loose numeric coercion: numbers pass through, numeric strings are parsed,
/// blank strings and `null` are zero, booleans are 0/1, everything else is NaN.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}
