// src/proto.rs

//! Generated gRPC types for the `spiceserver` proto package.

#![allow(missing_docs)]
#![allow(clippy::doc_markdown)]

tonic::include_proto!("spiceserver");
