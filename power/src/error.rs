use thiserror::Error;

#[derive(Debug, Error)]
pub enum PowerError {
    #[error("checkpoint at {at} is earlier than the last recorded checkpoint at {last}")]
    CheckpointOutOfOrder { at: u64, last: u64 },

    #[error("arithmetic overflow in weight aggregation")]
    Overflow,
}
