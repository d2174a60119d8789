use std::iter::FromIterator;
use std::slice;

#[cfg(feature = "serde")]
use serde::de::Deserialize;

#[cfg(feature = "serde")]
use crate::deserializer::deserialize_record;
#[cfg(feature = "serde")]
use crate::error::Result;

/// The fields of a single parsed record.
///
/// Every field is nullable. Empty tokens are normalized to `None` by the
/// parser, while columns padded in by missing-column tolerance are `Some("")`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Record(Vec<Option<String>>);

impl Record {
    /// Create a new empty record.
    pub fn new() -> Record {
        Record(vec![])
    }

    /// Returns the number of fields in this record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if this record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the field at index `i`.
    ///
    /// `None` is returned both for a null field and for an index that is out
    /// of bounds. Use [`as_slice`](#method.as_slice) to tell them apart.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.0.get(i).and_then(|f| f.as_deref())
    }

    /// Returns true if the field at index `i` exists and is null.
    pub fn is_null(&self, i: usize) -> bool {
        match self.0.get(i) {
            Some(None) => true,
            _ => false,
        }
    }

    /// Add a field to the end of this record.
    pub fn push_field(&mut self, field: Option<String>) {
        self.0.push(field);
    }

    /// Return an iterator over the fields of this record.
    pub fn iter(&self) -> RecordIter {
        RecordIter { it: self.0.iter() }
    }

    /// Return the fields of this record as a slice.
    pub fn as_slice(&self) -> &[Option<String>] {
        &self.0
    }

    /// Unwrap this record into its fields.
    pub fn into_inner(self) -> Vec<Option<String>> {
        self.0
    }

    /// Deserialize this record.
    ///
    /// When `headers` is given, structs and maps are filled by matching
    /// header names to field names. Otherwise fields are consumed in order.
    ///
    /// Null fields deserialize as `None` into `Option` values and as an
    /// empty string everywhere else.
    ///
    /// # Example
    ///
    /// ```
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Row {
    ///     name: String,
    ///     age: u32,
    ///     city: Option<String>,
    /// }
    ///
    /// let parser = csvline::FieldParser::new();
    /// let headers = parser.parse_line("age,name,city").unwrap().unwrap();
    /// let record = parser.parse_line("30,Alice,").unwrap().unwrap();
    ///
    /// let row: Row = record.deserialize(Some(&headers)).unwrap();
    /// assert_eq!(row.name, "Alice");
    /// assert_eq!(row.age, 30);
    /// assert_eq!(row.city, None);
    /// ```
    #[cfg(feature = "serde")]
    pub fn deserialize<'de, D: Deserialize<'de>>(
        &'de self,
        headers: Option<&'de Record>,
    ) -> Result<D> {
        deserialize_record(self, headers)
    }
}

impl From<Vec<Option<String>>> for Record {
    fn from(fields: Vec<Option<String>>) -> Record {
        Record(fields)
    }
}

impl From<Record> for Vec<Option<String>> {
    fn from(record: Record) -> Vec<Option<String>> {
        record.0
    }
}

impl<T: Into<String>> FromIterator<Option<T>> for Record {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Record {
        Record(iter.into_iter().map(|f| f.map(Into::into)).collect())
    }
}

impl<'r> IntoIterator for &'r Record {
    type IntoIter = RecordIter<'r>;
    type Item = Option<&'r str>;

    fn into_iter(self) -> RecordIter<'r> {
        self.iter()
    }
}

/// An iterator over the fields of a record.
///
/// The `'r` lifetime refers to the lifetime of the `Record` that is being
/// iterated over.
#[derive(Clone, Debug)]
pub struct RecordIter<'r> {
    it: slice::Iter<'r, Option<String>>,
}

impl<'r> Iterator for RecordIter<'r> {
    type Item = Option<&'r str>;

    fn next(&mut self) -> Option<Option<&'r str>> {
        self.it.next().map(|f| f.as_deref())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'r> DoubleEndedIterator for RecordIter<'r> {
    fn next_back(&mut self) -> Option<Option<&'r str>> {
        self.it.next_back().map(|f| f.as_deref())
    }
}

impl<'r> ExactSizeIterator for RecordIter<'r> {}
