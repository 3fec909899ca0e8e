use undock_runtime::ContainerRecord;
use undock_types::labels;
use undock_types::project::ServiceName;

/// Ordered snapshot of the containers believed to belong to one application instance.
///
/// Taken once per teardown operation and never reconciled against a later
/// query, since runtime state can change between calls.
#[derive(Clone, Debug, Default)]
pub struct Containers(Vec<ContainerRecord>);

impl Containers {

    pub fn new(containers: Vec<ContainerRecord>) -> Self {
        Self(containers)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContainerRecord> {
        self.0.iter()
    }

    /// Partitions into `(matched, remainder)` without consuming the input.
    /// Both outputs preserve the relative order of the original sequence.
    pub fn split(&self, predicate: impl Fn(&ContainerRecord) -> bool) -> (Containers, Containers) {
        let (matched, remainder) = self.0.iter()
            .cloned()
            .partition(|container| predicate(container));
        (Containers(matched), Containers(remainder))
    }

    /// Predicate matching containers labeled with the given service name.
    pub fn belonging_to_service(service: &ServiceName) -> impl Fn(&ContainerRecord) -> bool + '_ {
        move |container| {
            container.labels.get(labels::SERVICE_LABEL)
                .is_some_and(|label| label == service.as_ref())
        }
    }
}
