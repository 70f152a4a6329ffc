// src/service/convert.rs

//! Wire ↔ domain conversions.

use crate::job::{InputFile, JobInput, StructuredInput};
use crate::proto;
use crate::proto::simulation_request::Input;
use crate::proto::simulation_response::StreamType;
use crate::registry::Descriptor;
use crate::types::{ExitStatus, Flavour, OutputChunk, StreamKind};

/// Request input → job input. `None` when the caller sent neither variant.
pub fn job_input_from_wire(input: Option<Input>) -> Option<JobInput> {
    match input? {
        Input::VerbatimFiles(verbatim) => Some(JobInput::Verbatim(
            verbatim
                .files
                .into_iter()
                .map(|file| InputFile::new(file.path, file.data))
                .collect(),
        )),
        Input::StructuredInput(structured) => Some(JobInput::Structured(StructuredInput {
            format: structured.format,
            payload: structured.payload,
        })),
    }
}

pub fn stream_type(kind: StreamKind) -> StreamType {
    match kind {
        StreamKind::Stdout => StreamType::Stdout,
        StreamKind::Stderr => StreamType::Stderr,
    }
}

/// A non-final response carrying one chunk of output.
pub fn chunk_response(chunk: OutputChunk) -> proto::SimulationResponse {
    proto::SimulationResponse {
        output: chunk.bytes,
        stream_type: stream_type(chunk.stream) as i32,
        done: false,
        exit_code: 0,
        timed_out: false,
    }
}

/// The single final response.
pub fn done_response(status: ExitStatus, timed_out: bool) -> proto::SimulationResponse {
    proto::SimulationResponse {
        output: Vec::new(),
        stream_type: StreamType::Stdout as i32,
        done: true,
        exit_code: status.code(),
        timed_out,
    }
}

pub fn simulator_info(descriptor: &Descriptor) -> proto::SimulatorInfo {
    proto::SimulatorInfo {
        path: descriptor.executable_path.to_string_lossy().into_owned(),
        version: descriptor.version.clone(),
        name: descriptor.display_name.clone(),
        license: descriptor.license.clone(),
        flavours: descriptor
            .aliases
            .iter()
            .map(|flavour| flavour.wire_value())
            .collect(),
    }
}

pub fn simulator_entry(flavour: Flavour, descriptor: &Descriptor) -> proto::SimulatorEntry {
    proto::SimulatorEntry {
        flavour: flavour.wire_value(),
        info: Some(simulator_info(descriptor)),
    }
}
