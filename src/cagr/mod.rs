//! Client for UFSC's CAGR class registry ("cadastro de turmas").

pub mod errors;
pub mod models;
pub mod parse;
pub mod schedule;
pub mod semesters;
pub mod session;
pub mod transport;

pub use errors::{ParseError, PipelineError, ProtocolError, RowError};
pub use models::{Campus, Page, Semester};
pub use semesters::SemesterCatalog;
pub use session::{FetchOptions, PageFetcher, PaginationMode};
pub use transport::{Connector, HttpConnector, Transport};

/// The search page; also the landing page that hands out session cookies.
pub const BASE_URL: &str = "https://cagr.sistemas.ufsc.br/modules/comunidade/cadastroTurmas/";
