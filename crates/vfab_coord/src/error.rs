//! Coordinator errors.

use vfab_common::{AcceleratorId, CloudletId, FpgaId, InternalError};

/// Errors raised while driving the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// A request named an accelerator missing from the netlist catalog.
    #[error("accelerator {0} is not in the netlist catalog")]
    UnknownAccelerator(AcceleratorId),

    /// A payload or event named a fabric the coordinator does not manage.
    #[error("fpga {0} is not managed by this coordinator")]
    UnknownFpga(FpgaId),

    /// A cloudlet with this id was already submitted.
    #[error("cloudlet {0} was already submitted")]
    DuplicateCloudlet(CloudletId),

    /// No address left for a new component.
    #[error("address pool exhausted")]
    AddressesExhausted,

    /// Coordinator and manager state diverged.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
