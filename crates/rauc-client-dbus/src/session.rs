//! Installer session over D-Bus.

use crate::convert::{owner_event, status_event};
use crate::proxy::InstallerProxy;
use async_trait::async_trait;
use futures::StreamExt;
use rauc_client_core::{
    BusType, Endpoint, Error, EventClass, EventSink, InstallerConnector, InstallerSession,
    Result, SessionEvent,
};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use zbus::fdo::{PropertiesChanged, PropertiesProxy};
use zbus::names::BusName;
use zbus::zvariant::ObjectPath;
use zbus::Connection;

/// Opens [`DbusSession`]s on the system or session bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbusConnector;

impl DbusConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl InstallerConnector for DbusConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        executor: Handle,
    ) -> Result<Box<dyn InstallerSession>> {
        let service = BusName::try_from(endpoint.service.clone()).map_err(|e| {
            Error::InvalidConfig {
                field: "installer.service".to_string(),
                message: e.to_string(),
            }
        })?;
        let path = ObjectPath::try_from(endpoint.object_path.clone()).map_err(|e| {
            Error::InvalidConfig {
                field: "installer.object_path".to_string(),
                message: e.to_string(),
            }
        })?;

        let connection = match endpoint.bus {
            BusType::Session => Connection::session().await,
            BusType::System => Connection::system().await,
        }
        .map_err(connection_error)?;
        debug!(bus = %endpoint.bus, unique_name = ?connection.unique_name(), "Connected to bus");

        let installer: InstallerProxy<'static> = InstallerProxy::builder(&connection)
            .destination(service.clone())
            .map_err(connection_error)?
            .path(path.clone())
            .map_err(connection_error)?
            .cache_properties(zbus::proxy::CacheProperties::No)
            .build()
            .await
            .map_err(connection_error)?;

        let properties: PropertiesProxy<'static> = PropertiesProxy::builder(&connection)
            .destination(service)
            .map_err(connection_error)?
            .path(path)
            .map_err(connection_error)?
            .build()
            .await
            .map_err(connection_error)?;

        Ok(Box::new(DbusSession {
            _connection: connection,
            installer,
            properties,
            executor,
            pumps: Vec::new(),
        }))
    }
}

/// Live proxy to one installer object.
///
/// Every subscription is a pump task on the worker's runtime that forwards
/// decoded signals into the worker's event channel.
pub struct DbusSession {
    _connection: Connection,
    installer: InstallerProxy<'static>,
    properties: PropertiesProxy<'static>,
    executor: Handle,
    pumps: Vec<JoinHandle<()>>,
}

impl DbusSession {
    async fn watch_status(&self, sink: EventSink) -> zbus::Result<JoinHandle<()>> {
        let properties = self.properties.clone();
        let owner = self.installer.inner().clone();
        let (ready_tx, ready_rx) = oneshot::channel();

        let pump = self.executor.spawn(async move {
            let streams = async {
                let changes = properties.receive_properties_changed().await?;
                let owners = owner.receive_owner_changed().await?;
                Ok::<_, zbus::Error>((changes, owners))
            };
            let (mut changes, mut owners) = match streams.await {
                Ok(streams) => {
                    let _ = ready_tx.send(Ok(()));
                    streams
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            loop {
                let event = tokio::select! {
                    signal = changes.next() => match signal {
                        Some(signal) => decode_status(&signal),
                        None => break,
                    },
                    name = owners.next() => {
                        if let Some(Some(name)) = &name {
                            debug!(%name, "Installer service owner changed");
                        }
                        owner_event(name)
                    }
                };
                let Some(event) = event else {
                    continue;
                };
                let gone = event == SessionEvent::Invalidated;
                if sink.send(event).is_err() || gone {
                    break;
                }
            }
        });

        started(pump, ready_rx).await
    }

    async fn watch_completed(&self, sink: EventSink) -> zbus::Result<JoinHandle<()>> {
        let installer = self.installer.clone();
        let (ready_tx, ready_rx) = oneshot::channel();

        let pump = self.executor.spawn(async move {
            let mut completed = match installer.receive_completed().await {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    stream
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            while let Some(signal) = completed.next().await {
                match signal.args() {
                    Ok(args) => {
                        if sink.send(SessionEvent::Completed(*args.result())).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Malformed Completed signal"),
                }
            }
        });

        started(pump, ready_rx).await
    }
}

/// Wait until a pump has its match rules in place.
async fn started(
    pump: JoinHandle<()>,
    ready: oneshot::Receiver<zbus::Result<()>>,
) -> zbus::Result<JoinHandle<()>> {
    match ready.await {
        Ok(Ok(())) => Ok(pump),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(zbus::Error::Failure(
            "signal pump stopped before subscribing".to_string(),
        )),
    }
}

fn decode_status(signal: &PropertiesChanged) -> Option<SessionEvent> {
    match signal.args() {
        Ok(args) => status_event(
            args.interface_name().as_str(),
            args.changed_properties(),
            args.invalidated_properties(),
        ),
        Err(e) => {
            warn!(error = %e, "Malformed PropertiesChanged signal");
            None
        }
    }
}

#[async_trait]
impl InstallerSession for DbusSession {
    async fn subscribe(&mut self, class: EventClass, sink: EventSink) -> Result<()> {
        let pump = match class {
            EventClass::StatusChanged => self.watch_status(sink).await,
            EventClass::Completed => self.watch_completed(sink).await,
        }
        .map_err(|e| subscription_error(class, e))?;
        self.pumps.push(pump);
        debug!(%class, "Subscribed to installer events");
        Ok(())
    }

    async fn install(&self, bundle: &str) -> Result<()> {
        self.installer.install(bundle).await.map_err(invocation_error)
    }

    fn disconnect_all(&mut self) {
        for pump in self.pumps.drain(..) {
            pump.abort();
        }
    }
}

impl Drop for DbusSession {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

fn connection_error(e: zbus::Error) -> Error {
    Error::Connection(e.to_string())
}

fn subscription_error(class: EventClass, e: zbus::Error) -> Error {
    Error::Subscription {
        class,
        message: e.to_string(),
    }
}

fn invocation_error(e: zbus::Error) -> Error {
    match e {
        zbus::Error::MethodError(name, Some(message), _) => {
            Error::Invocation(format!("{}: {}", name, message))
        }
        other => Error::Invocation(other.to_string()),
    }
}
