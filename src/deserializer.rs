use std::iter;

use serde::de::value::BorrowedStrDeserializer;
use serde::de::{
    Deserialize, DeserializeSeed, Deserializer, EnumAccess, MapAccess,
    SeqAccess, Unexpected, VariantAccess, Visitor,
};

use crate::error::{Error, Result};
use crate::record::{Record, RecordIter};

/// Deserialize a record, optionally keyed by a header record.
pub fn deserialize_record<'de, D: Deserialize<'de>>(
    record: &'de Record,
    headers: Option<&'de Record>,
) -> Result<D> {
    let mut de = DeRecord {
        it: record.iter().peekable(),
        headers: headers.map(|h| h.iter()),
        field: 0,
    };
    D::deserialize(&mut de)
}

struct DeRecord<'r> {
    it: iter::Peekable<RecordIter<'r>>,
    headers: Option<RecordIter<'r>>,
    field: u64,
}

impl<'r> DeRecord<'r> {
    /// Returns an error for the most recently extracted field.
    fn error<T: ToString>(&self, message: T) -> Error {
        Error::Deserialize {
            field: self.field.saturating_sub(1),
            message: message.to_string(),
        }
    }

    /// Extracts the next field. A null field reads as an empty string.
    fn next_field(&mut self) -> Result<&'r str> {
        match self.it.next() {
            Some(field) => {
                self.field += 1;
                Ok(field.unwrap_or(""))
            }
            None => Err(Error::Deserialize {
                field: self.field,
                message: "unexpected end of record".to_string(),
            }),
        }
    }

    /// Peeks at the next field. The outer `None` means the record is
    /// exhausted.
    fn peek_field(&mut self) -> Option<Option<&'r str>> {
        self.it.peek().cloned()
    }
}

macro_rules! deserialize_parse {
    ($method:ident, $visit:ident) => {
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
            let field = self.next_field()?;
            visitor.$visit(field.trim().parse().map_err(|err| self.error(err))?)
        }
    };
}

impl<'a, 'de: 'a> Deserializer<'de> for &'a mut DeRecord<'de> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if let Some(None) = self.peek_field() {
            self.next_field()?;
            return visitor.visit_none();
        }
        let field = self.next_field()?;
        if field == "true" {
            visitor.visit_bool(true)
        } else if field == "false" {
            visitor.visit_bool(false)
        } else if let Ok(n) = field.parse::<u64>() {
            visitor.visit_u64(n)
        } else if let Ok(n) = field.parse::<i64>() {
            visitor.visit_i64(n)
        } else if let Ok(n) = field.parse::<f64>() {
            visitor.visit_f64(n)
        } else {
            visitor.visit_borrowed_str(field)
        }
    }

    deserialize_parse!(deserialize_bool, visit_bool);
    deserialize_parse!(deserialize_u8, visit_u8);
    deserialize_parse!(deserialize_u16, visit_u16);
    deserialize_parse!(deserialize_u32, visit_u32);
    deserialize_parse!(deserialize_u64, visit_u64);
    deserialize_parse!(deserialize_i8, visit_i8);
    deserialize_parse!(deserialize_i16, visit_i16);
    deserialize_parse!(deserialize_i32, visit_i32);
    deserialize_parse!(deserialize_i64, visit_i64);
    deserialize_parse!(deserialize_f32, visit_f32);
    deserialize_parse!(deserialize_f64, visit_f64);

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        let field = self.next_field()?;
        let mut chars = field.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.error(format!(
                "expected a single character but got {:?}",
                field
            ))),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.next_field().and_then(|f| visitor.visit_borrowed_str(f))
    }

    fn deserialize_string<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value> {
        self.next_field().and_then(|f| visitor.visit_str(f))
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.next_field()
            .and_then(|f| visitor.visit_borrowed_bytes(f.as_bytes()))
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value> {
        self.next_field()
            .and_then(|f| visitor.visit_byte_buf(f.as_bytes().to_vec()))
    }

    fn deserialize_option<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value> {
        match self.peek_field() {
            None => visitor.visit_none(),
            Some(None) | Some(Some("")) => {
                self.next_field()?;
                visitor.visit_none()
            }
            Some(Some(_)) => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        self.next_field()?;
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        visitor.visit_seq(self)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_seq(self)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_seq(self)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        if self.headers.is_none() {
            visitor.visit_seq(self)
        } else {
            visitor.visit_map(self)
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_enum(self)
    }

    fn deserialize_identifier<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value> {
        // Reached for header columns the target type has no field for.
        self.next_field()?;
        visitor.visit_unit()
    }
}

impl<'a, 'de: 'a> EnumAccess<'de> for &'a mut DeRecord<'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self)> {
        let name = self.next_field()?;
        let de = BorrowedStrDeserializer::<Error>::new(name);
        seed.deserialize(de).map(|v| (v, self))
    }
}

impl<'a, 'de: 'a> VariantAccess<'de> for &'a mut DeRecord<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        _seed: T,
    ) -> Result<T::Value> {
        Err(serde::de::Error::invalid_type(
            Unexpected::UnitVariant,
            &"newtype variant",
        ))
    }

    fn tuple_variant<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value> {
        Err(serde::de::Error::invalid_type(
            Unexpected::UnitVariant,
            &"tuple variant",
        ))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value> {
        Err(serde::de::Error::invalid_type(
            Unexpected::UnitVariant,
            &"struct variant",
        ))
    }
}

impl<'a, 'de: 'a> SeqAccess<'de> for &'a mut DeRecord<'de> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        if self.peek_field().is_none() {
            Ok(None)
        } else {
            seed.deserialize(&mut **self).map(Some)
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.it.len())
    }
}

impl<'a, 'de: 'a> MapAccess<'de> for &'a mut DeRecord<'de> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>> {
        let header = match self.headers.as_mut().and_then(|it| it.next()) {
            None => return Ok(None),
            Some(header) => header.unwrap_or(""),
        };
        let de = BorrowedStrDeserializer::<Error>::new(header);
        seed.deserialize(de).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value> {
        seed.deserialize(&mut **self)
    }
}
