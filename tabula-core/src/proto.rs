//! # Wire Types
//!
//! Protobuf messages exchanged with the table service. The sources live in
//! `tabula-core/proto` and the Rust code under `proto/generated` is produced by the
//! `generate-data-service` binary (`gen-proto` feature). Do not edit it by hand.
//!
//! Nothing outside the request builders and the stubs should need these types:
//! callers work with [`crate::mutation::Mutation`], [`crate::row_set::RowSet`] and
//! [`crate::filter::Filter`], which are converted to wire form at request-build time.

pub mod tabula {
    pub mod v2 {
        include!("proto/generated/tabula.v2.rs");
    }
}

pub mod google {
    pub mod rpc {
        include!("proto/generated/google.rpc.rs");
    }

    pub mod longrunning {
        include!("proto/generated/google.longrunning.rs");
    }
}

pub use google::longrunning;
pub use tabula::v2;
