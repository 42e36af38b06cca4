//! Fulfillment handlers - the claim-and-dispatch trigger and worker reports.

mod report_fulfillment;
mod trigger_fulfillment;

pub use report_fulfillment::{
    FulfillmentOutcome, ReportFulfillmentCommand, ReportFulfillmentHandler,
    ReportFulfillmentResult,
};
pub use trigger_fulfillment::{
    TriggerFulfillmentCommand, TriggerFulfillmentHandler, TriggerOutcome,
};
