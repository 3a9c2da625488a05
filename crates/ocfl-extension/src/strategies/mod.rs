//! Built-in extensions.

pub mod direct;
pub mod filter;
pub mod fixity;
pub mod hashed;
pub mod omit_prefix;
pub mod pairtree;
pub mod summary;

pub use direct::{Direct, DirectClean, FlatDirect, DIRECT_CLEAN_NAME, DIRECT_NAME, FLAT_DIRECT_NAME};
pub use filter::{ContentFilter, CONTENT_FILTER_NAME};
pub use fixity::{FixityDigests, FIXITY_DIGESTS_NAME};
pub use hashed::{percent_encode_id, HashAndIdNTuple, HashedNTuple, HASHED_N_TUPLE_NAME, HASH_AND_ID_NAME};
pub use omit_prefix::{FlatOmitPrefix, FLAT_OMIT_PREFIX_NAME};
pub use pairtree::{pairtree_clean, PairTree, ShardedPairTree, PAIRTREE_NAME, SHARDED_PAIRTREE_NAME};
pub use summary::{ContentSummary, CONTENT_SUMMARY_NAME};
