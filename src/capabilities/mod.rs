mod http;
mod storage;

pub use self::http::{
    Http, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResult, ValidatedUrl,
    DEFAULT_TIMEOUT_MS,
};
pub use self::storage::{Storage, StorageError, StorageOperation, StorageOutput, StorageResult};

pub use crux_core::render::Render;

use crate::event::Event;

pub type AppHttp = Http<Event>;
pub type AppStorage = Storage<Event>;
pub type AppRender = Render<Event>;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub storage: Storage<Event>,
    pub render: Render<Event>,
}
