//! Listener hooks for incremental conversion events.
//!
//! Listeners are called synchronously from `Converter::convert`, in page
//! order, before the next page is started. All methods default to no-ops.

use crate::{error::ConvertError, report::PageResult};

pub trait ConvertListener {
    /// A page was written.
    fn on_page(&mut self, result: &PageResult) {
        let _ = result;
    }

    /// Every target page was written; `results` is in processing order.
    fn on_complete(&mut self, results: &[PageResult]) {
        let _ = results;
    }

    /// The conversion stopped. No further events follow.
    fn on_error(&mut self, error: &ConvertError) {
        let _ = error;
    }
}

/// Adapts a closure over [`ConvertEvent`] into a listener.
pub struct FnListener<F>(pub F);

#[derive(Debug)]
pub enum ConvertEvent<'a> {
    PageProcessed(&'a PageResult),
    Completed(&'a [PageResult]),
    Failed(&'a ConvertError),
}

impl<F> ConvertListener for FnListener<F>
where
    F: FnMut(ConvertEvent<'_>),
{
    fn on_page(&mut self, result: &PageResult) {
        (self.0)(ConvertEvent::PageProcessed(result));
    }

    fn on_complete(&mut self, results: &[PageResult]) {
        (self.0)(ConvertEvent::Completed(results));
    }

    fn on_error(&mut self, error: &ConvertError) {
        (self.0)(ConvertEvent::Failed(error));
    }
}
