// Tool capability layer
//
// Tools are external capabilities (analytics connectors, web scrapers) that an
// agent may invoke by name. Each category has one interface; named
// implementations live in the ToolRegistry and are resolved when a team is
// constructed.

pub mod fault;
pub mod registry;
pub mod requests;
pub mod retry;

pub use fault::ToolFault;
pub use registry::{DataSourceConnector, ToolHandle, ToolRegistry, WebScraper};
pub use requests::{DataSourceRequest, ScrapeAction, ScrapeRequest};
pub use retry::RetryPolicy;
