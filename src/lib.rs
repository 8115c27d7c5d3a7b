//! openapi-from-comments - OpenAPI documents from apiDoc-style annotation comments.
//!
//! Source files in many languages carry documentation blocks such as
//!
//! ```text
//! /**
//!  * @api {get} /users/:id Read user
//!  * @apiGroup User
//!  * @apiParam {Number} id Users unique ID.
//!  */
//! ```
//!
//! This library finds those blocks, parses their `@api*` tags into structured
//! records, resolves cross-block references (`@apiDefine` / `@apiUse`,
//! groups, names, versions) and synthesizes an OpenAPI 3.0 document.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Finds and decodes the source files
//! 2. [`block`] and [`element`] - Tokenize comment blocks and `@tag` elements, per [`language`]
//! 3. [`parser`] with [`parsers`] - Turns the elements of each block into a record
//! 4. [`filter`] - Post-filters and the selection of endpoint blocks
//! 5. [`workers`] - Cross-block resolution, with [`merge`] and [`version`]
//! 6. [`schema_generator`] and [`openapi_builder`] - Build the OpenAPI document
//! 7. [`serializer`] - Writes the document as JSON or YAML
//!
//! [`pipeline`] runs stages 3 to 6; [`info`] supplies the document's `info`.
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_comments::{
//!     info::PackageInfo,
//!     parser::ParseOptions,
//!     pipeline::Pipeline,
//!     scanner::FileScanner,
//!     serializer::serialize_json,
//!     workers::PackageDefaults,
//! };
//! use std::path::{Path, PathBuf};
//!
//! let units = FileScanner::new(PathBuf::from("./src")).unwrap().read_sources().unwrap();
//! let package = PackageInfo::load(Path::new("./src")).unwrap();
//!
//! let mut pipeline = Pipeline::new(ParseOptions::default(), PackageDefaults::default());
//! let document = pipeline.generate(&units, &package).unwrap();
//!
//! println!("{}", serialize_json(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod block;
pub mod cli;
pub mod element;
pub mod error;
pub mod filter;
pub mod info;
pub mod language;
pub mod markdown;
pub mod merge;
pub mod openapi_builder;
pub mod parser;
pub mod parsers;
pub mod pipeline;
pub mod scanner;
pub mod schema_generator;
pub mod serializer;
pub mod text;
pub mod version;
pub mod workers;
