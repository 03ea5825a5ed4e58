//! [`Actuator`] implementation for HTTP control endpoints.
//!
//! Commands become requests against `base_url` followed by a route. Routes carry their values
//! in placeholders: `{pan}` and `{tilt}` for the pose route (whole degrees), `{value}` for the
//! others (direction word, preset token or home index).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use ptz_if::{ActCmd, Pose};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use ureq::Agent;

use super::{format_deg, is_safe_value, Actuator, ActuatorError, Dispatch, DEFAULT_TIMEOUT_MS};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const VALUE_MARKER: &str = "{value}";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the HTTP actuator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpParams {
    /// Base URL of the control endpoint, e.g. `http://127.0.0.1:7777`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub method: HttpMethod,

    /// Route driving the rig to an absolute pose.
    #[serde(default = "default_pose_route")]
    pub pose_route: String,

    /// Route starting a directional move, `{value}` is the direction word.
    #[serde(default)]
    pub move_route: Option<String>,

    /// Route stopping all motion, `{value}` is `stop`.
    #[serde(default)]
    pub stop_route: Option<String>,

    /// Route recalling a preset stored on the rig, `{value}` is the preset token.
    #[serde(default)]
    pub recall_route: Option<String>,

    /// Route recalling the rig's home position, `{value}` is the home index.
    #[serde(default)]
    pub home_route: Option<String>,

    /// Bound on a whole request, including connection and response.
    ///
    /// Units: milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Actuator calling an HTTP control endpoint.
pub struct HttpActuator {
    params: HttpParams,

    agent: Agent,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::Get
    }
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            method: HttpMethod::default(),
            pose_route: default_pose_route(),
            move_route: None,
            stop_route: None,
            recall_route: None,
            home_route: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl HttpActuator {
    pub fn new(params: HttpParams) -> Self {
        // Non-2xx statuses are recorded as results rather than surfaced as errors. The endpoint
        // is local to the rig, so proxies from the environment are ignored.
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_millis(params.timeout_ms)))
            .http_status_as_error(false)
            .proxy(None)
            .build()
            .into();

        Self { params, agent }
    }

    /// Build the URL for a command, `Ok(None)` if no route is configured for it.
    pub fn url(&self, cmd: &ActCmd) -> Result<Option<String>, ActuatorError> {
        let route = match cmd {
            ActCmd::Pose(pose) => Some(pose_route(&self.params.pose_route, pose)),
            ActCmd::Move(dir) => value_route(&self.params.move_route, dir.word())?,
            ActCmd::Stop => value_route(&self.params.stop_route, "stop")?,
            ActCmd::Recall(token) => value_route(&self.params.recall_route, token)?,
            ActCmd::Home(index) => value_route(&self.params.home_route, index)?,
        };

        Ok(route.map(|r| format!("{}{}", self.params.base_url.trim_end_matches('/'), r)))
    }
}

impl Actuator for HttpActuator {
    fn name(&self) -> &'static str {
        "http"
    }

    fn dispatch(&self, cmd: &ActCmd) -> Dispatch {
        let url = match self.url(cmd) {
            Ok(Some(u)) => u,
            Ok(None) => return Dispatch::Unsupported,
            Err(e) => return Dispatch::Failed(e),
        };

        debug!("HTTP {:?} {}", self.params.method, url);

        let response = match self.params.method {
            HttpMethod::Get => self.agent.get(&url).call(),
            HttpMethod::Post => self.agent.post(&url).send_empty(),
        };

        match response {
            Ok(r) => Dispatch::Completed {
                code: i32::from(r.status().as_u16()),
                ok: r.status().is_success(),
            },
            Err(ureq::Error::Timeout(_)) => Dispatch::Failed(ActuatorError::Timeout(
                Duration::from_millis(self.params.timeout_ms),
            )),
            Err(e) => Dispatch::Failed(ActuatorError::Http(e)),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn pose_route(route: &str, pose: &Pose) -> String {
    route
        .replace("{pan}", &format_deg(pose.pan_deg))
        .replace("{tilt}", &format_deg(pose.tilt_deg))
}

fn value_route(route: &Option<String>, value: &str) -> Result<Option<String>, ActuatorError> {
    match route {
        Some(r) => {
            if !is_safe_value(value) {
                return Err(ActuatorError::UnsafeValue(value.to_string()));
            }
            Ok(Some(r.replacen(VALUE_MARKER, value, 1)))
        }
        None => Ok(None),
    }
}

fn default_base_url() -> String {
    String::from("http://127.0.0.1:7777")
}

fn default_pose_route() -> String {
    String::from("/rotatePT/{pan}/{tilt}")
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[cfg(test)]
mod test {
    use super::*;
    use ptz_if::Direction;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc::{channel, Receiver};
    use std::thread;

    /// Serve one connection, replying with `status` (or never replying if `None`), and send the
    /// request line back to the test.
    fn serve_once(status: Option<&'static str>) -> (String, Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = channel();

        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
                    break;
                }
            }
            tx.send(request_line.trim_end().to_string()).unwrap();

            match status {
                Some(s) => {
                    let mut stream = stream;
                    write!(
                        stream,
                        "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        s
                    )
                    .unwrap();
                }
                // Hold the connection open without answering
                None => thread::sleep(Duration::from_secs(2)),
            }
        });

        (base_url, rx)
    }

    fn actuator(base_url: String) -> HttpActuator {
        HttpActuator::new(HttpParams {
            base_url,
            move_route: Some("/move/{value}".into()),
            timeout_ms: 300,
            ..HttpParams::default()
        })
    }

    #[test]
    fn test_pose_request() {
        let (base_url, rx) = serve_once(Some("200 OK"));
        let act = actuator(base_url);

        let dispatch = act.dispatch(&ActCmd::Pose(Pose::new(45.0, 0.0)));
        assert!(matches!(dispatch, Dispatch::Completed { code: 200, ok: true }));
        assert_eq!(rx.recv().unwrap(), "GET /rotatePT/45/0 HTTP/1.1");
    }

    #[test]
    fn test_error_status_is_recorded() {
        let (base_url, rx) = serve_once(Some("500 Internal Server Error"));
        let act = actuator(base_url);

        let dispatch = act.dispatch(&ActCmd::Move(Direction::Left));
        assert!(matches!(dispatch, Dispatch::Completed { code: 500, ok: false }));
        assert_eq!(rx.recv().unwrap(), "GET /move/left HTTP/1.1");
    }

    #[test]
    fn test_timeout() {
        let (base_url, _rx) = serve_once(None);
        let act = actuator(base_url);

        let dispatch = act.dispatch(&ActCmd::Pose(Pose::new(10.0, 10.0)));
        assert!(matches!(dispatch, Dispatch::Failed(_)));
    }

    #[test]
    fn test_unconfigured_routes() {
        let act = actuator("http://127.0.0.1:1".into());

        assert!(matches!(act.dispatch(&ActCmd::Stop), Dispatch::Unsupported));
        assert!(matches!(
            act.dispatch(&ActCmd::Recall("1".into())),
            Dispatch::Unsupported
        ));
        assert!(matches!(
            act.dispatch(&ActCmd::Home("1".into())),
            Dispatch::Unsupported
        ));
    }

    #[test]
    fn test_urls() {
        let act = HttpActuator::new(HttpParams {
            base_url: "http://rig.local:7777/".into(),
            recall_route: Some("/preset/{value}".into()),
            ..HttpParams::default()
        });

        assert_eq!(
            act.url(&ActCmd::Pose(Pose::new(90.4, 12.6))).unwrap().unwrap(),
            "http://rig.local:7777/rotatePT/90/13"
        );
        assert_eq!(
            act.url(&ActCmd::Recall("A".into())).unwrap().unwrap(),
            "http://rig.local:7777/preset/A"
        );
        assert!(matches!(
            act.url(&ActCmd::Recall("a/../b".into())),
            Err(ActuatorError::UnsafeValue(_))
        ));
    }
}
