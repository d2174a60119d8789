use bstr::ByteSlice;
use serde::ser::{
    Error as SerdeError, Impossible, Serialize, SerializeSeq,
    SerializeStruct, SerializeTuple, SerializeTupleStruct, Serializer,
};

use crate::builder::RecordBuilder;
use crate::error::Error;

/// Serialize the given value as values of the record in progress.
///
/// The record is not ended; the caller decides when it is complete.
pub fn serialize<S: ?Sized + Serialize>(
    builder: &mut RecordBuilder,
    value: &S,
) -> Result<(), Error> {
    value.serialize(&mut SeRecord { builder })
}

struct SeRecord<'b> {
    builder: &'b mut RecordBuilder,
}

impl<'b> SeRecord<'b> {
    fn value(&mut self, value: &str) -> Result<(), Error> {
        self.builder.add_value(value).map(|_| ())
    }
}

impl<'a, 'b> Serializer for &'a mut SeRecord<'b> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Impossible<(), Error>;
    type SerializeMap = Impossible<(), Error>;
    type SerializeStruct = Self;
    type SerializeStructVariant = Impossible<(), Error>;

    fn serialize_bool(self, v: bool) -> Result<(), Error> {
        self.value(if v { "true" } else { "false" })
    }

    fn serialize_i8(self, v: i8) -> Result<(), Error> {
        self.value(itoa::Buffer::new().format(v))
    }

    fn serialize_i16(self, v: i16) -> Result<(), Error> {
        self.value(itoa::Buffer::new().format(v))
    }

    fn serialize_i32(self, v: i32) -> Result<(), Error> {
        self.value(itoa::Buffer::new().format(v))
    }

    fn serialize_i64(self, v: i64) -> Result<(), Error> {
        self.value(itoa::Buffer::new().format(v))
    }

    fn serialize_u8(self, v: u8) -> Result<(), Error> {
        self.value(itoa::Buffer::new().format(v))
    }

    fn serialize_u16(self, v: u16) -> Result<(), Error> {
        self.value(itoa::Buffer::new().format(v))
    }

    fn serialize_u32(self, v: u32) -> Result<(), Error> {
        self.value(itoa::Buffer::new().format(v))
    }

    fn serialize_u64(self, v: u64) -> Result<(), Error> {
        self.value(itoa::Buffer::new().format(v))
    }

    fn serialize_f32(self, v: f32) -> Result<(), Error> {
        self.value(ryu::Buffer::new().format(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), Error> {
        self.value(ryu::Buffer::new().format(v))
    }

    fn serialize_char(self, v: char) -> Result<(), Error> {
        self.value(v.encode_utf8(&mut [0; 4]))
    }

    fn serialize_str(self, value: &str) -> Result<(), Error> {
        self.value(value)
    }

    fn serialize_bytes(self, value: &[u8]) -> Result<(), Error> {
        self.value(&value.to_str_lossy())
    }

    fn serialize_none(self) -> Result<(), Error> {
        self.value("")
    }

    fn serialize_some<T: ?Sized + Serialize>(
        self,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), Error> {
        self.value("")
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<(), Error> {
        self.value(name)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<(), Error> {
        self.value(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(self)
    }

    fn serialize_seq(
        self,
        _len: Option<usize>,
    ) -> Result<Self::SerializeSeq, Error> {
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Error> {
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Error> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Error> {
        Err(Error::custom("serializing enum tuple variants is not supported"))
    }

    fn serialize_map(
        self,
        _len: Option<usize>,
    ) -> Result<Self::SerializeMap, Error> {
        // Map keys have no stable column order.
        Err(Error::custom("serializing maps is not supported"))
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Error> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Error> {
        Err(Error::custom("serializing enum struct variants is not supported"))
    }
}

impl<'a, 'b> SerializeSeq for &'a mut SeRecord<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl<'a, 'b> SerializeTuple for &'a mut SeRecord<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl<'a, 'b> SerializeTupleStruct for &'a mut SeRecord<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}

impl<'a, 'b> SerializeStruct for &'a mut SeRecord<'b> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        value: &T,
    ) -> Result<(), Error> {
        value.serialize(&mut **self)
    }

    fn end(self) -> Result<(), Error> {
        Ok(())
    }
}
