//! Built-in Views
//!
//! Screens shipped with the kit. `loading`, `form`, `frame` and `error` are
//! special-cased by the container through their type tags; the rest are
//! ordinary views.

mod collection;
mod document;
mod entity;
mod error;
mod form;
mod frame;
mod loading;
mod table;

pub use collection::{CollectionItem, CollectionView, SelectFn};
pub use document::DocumentView;
pub use entity::{Entity, EntityFormat, EntityView};
pub use error::ErrorView;
pub use form::{Field, FieldKind, FormValues, FormView, SubmitFn};
pub use frame::FrameView;
pub use loading::LoadingView;
pub use table::{RowHoverFn, RowSelectFn, TableColumn, TableMode, TableRow, TableView};
