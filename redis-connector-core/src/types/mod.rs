//! Typed options and results accepted and produced by commands

pub mod bitfield;
pub mod cluster;
pub mod expiration;
pub mod geo;
pub mod keys;
pub mod pubsub;
pub mod range;
pub mod scan;
pub mod scripting;
pub mod server;
pub mod zset;

pub use bitfield::{BitFieldSubCommand, BitFieldSubCommands, BitFieldType, Offset, Overflow};
pub use cluster::{ClusterNode, LinkState, NodeFlag, SlotRange};
pub use expiration::{ExpireCondition, Expiration, SetCondition, TimeUnit};
pub use geo::{
    Circle, Distance, GeoLocation, GeoRadiusArgs, GeoReference, GeoResult, GeoResults,
    GeoSearchStoreArgs, GeoShape, Metric, Point,
};
pub use keys::{
    BitOperation, DataType, ListDirection, ListPosition, SortOrder, SortParameters,
    ValueEncoding,
};
pub use pubsub::Message;
pub use range::{Limit, Range};
pub use scan::{ScanOptions, ScanPage};
pub use scripting::{ReturnType, ScriptOutput};
pub use server::{ClientInfo, FlushMode, MigrateOption, Properties, ShutdownOption};
pub use zset::{Aggregate, Tuple, Weights, ZAddArgs};
