//! The mapping model produced by binding.

mod collection;
mod definition;
mod entity;
mod join;
mod property;
mod query;
mod table;
mod value;

pub use collection::{Collection, CollectionKind, SortStrategy};
pub use definition::{AuxiliaryDatabaseObject, FilterDefinition, TypeDef};
pub use entity::{
    CacheSettings, CustomSql, CustomSqlSet, Discriminator, EntityKind, EntityMapping, FilterUse,
    IdentifierBinding, OptimisticLock, PersisterStrategy, RootData,
};
pub use join::Join;
pub use property::{
    Backref, BackrefKind, Property, PropertyGeneration, cascade_tokens, cascades_delete_orphan,
};
pub use query::{
    CacheMode, CollectionReturn, EntityReturn, FlushMode, JoinReturn, LockMode, NamedQuery,
    NamedSqlQuery, QuerySettings, ResultSetMapping, RootReturn, ScalarReturn, SqlQueryResults,
};
pub use table::{
    Column, ForeignKey, Index, PrimaryKey, Selectable, Table, TableId, TableKey, UniqueKey,
    constraint_name,
};
pub use value::{
    AnyValue, CollectionRef, Component, DependantValue, FetchMode, ForeignKeyDirection,
    IdentifierGenerator, ManyToOne, OneToMany, OneToOne, SimpleValue, ToOne, Value,
};
