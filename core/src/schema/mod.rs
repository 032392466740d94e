mod primitive_schema;
mod schema;

pub use primitive_schema::{PrimitiveField, PrimitiveLink, PrimitiveSchema, PrimitiveTable};
pub use schema::{
    Database, Field, FieldId, FieldType, Link, LinkId, Pointers, Table, TableId, TableKind, REC_ID,
};
