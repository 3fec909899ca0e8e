mod rt;
mod client;

pub use rt::{
    ContainerRuntime,
    ContainerRuntimeError,
    ContainerRuntimeErrorKind,
};

pub use client::{
    Client,
    ContainerId,
    ContainerRecord,
    ContainerState,
    NetworkId,
    NetworkRecord,
};

#[cfg(feature = "docker")]
pub use client::docker::DockerClient;

#[cfg(feature = "mock")]
pub use client::mock::{
    MockClient,
    MockClientInvocation,
};
