// * Customer records: the unit of work handed from the loader to the importer

pub mod customer;

pub use customer::{BillingPeriod, CustomerRecord, CustomerRecordBuilder, RecordError};
