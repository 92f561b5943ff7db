//! Coordinator events and routed payloads.

use vfab_accel::{AccelerableSegment, Bitstream};
use vfab_common::{Address, CloudletId, FpgaId, SegmentId, VFpgaId};
use vfab_vfpga::ReconfigurationRequest;

/// A payload routed to an [`Endpoint`](crate::Endpoint) by address.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Bitstream and target rows for a configuration manager.
    ConfigureRegions {
        /// The partial bitstream to load.
        bitstream: Bitstream,
        /// The task and rows it is loaded for.
        request: ReconfigurationRequest,
    },
    /// Segment input for a virtual FPGA.
    SegmentInput {
        /// The segment to run.
        segment: AccelerableSegment,
    },
    /// A virtual FPGA's result, sent to the coordinator at teardown.
    SegmentOutput {
        /// The finished instance.
        vfpga: VFpgaId,
        /// The segment it ran, or `None` if it was torn down idle.
        segment: Option<AccelerableSegment>,
    },
    /// A virtual FPGA finished configuring.
    VFpgaReady {
        /// The new instance.
        vfpga: VFpgaId,
    },
}

impl Payload {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::ConfigureRegions { .. } => "configure-regions",
            Payload::SegmentInput { .. } => "segment-input",
            Payload::SegmentOutput { .. } => "segment-output",
            Payload::VFpgaReady { .. } => "vfpga-ready",
        }
    }
}

/// Events the coordinator schedules on the kernel.
#[derive(Debug, Clone)]
pub enum Event {
    /// Schedule the next queued request batch.
    ScheduleBatch,
    /// Advance every fabric.
    UpdateProcessing,
    /// Hand a payload to the owner of an address.
    Deliver {
        /// Destination address.
        to: Address,
        /// The payload.
        payload: Payload,
    },
    /// A bitstream finished loading.
    ReconfigurationFinished {
        /// The fabric that was configured.
        fpga: FpgaId,
        /// The configured instance.
        vfpga: VFpgaId,
    },
    /// Work running on the VM's CPU finished.
    CpuPortionFinished {
        /// The owning cloudlet.
        cloudlet: CloudletId,
        /// The diverted segment, or `None` for the non-accelerable part.
        segment: Option<SegmentId>,
    },
}
