//! Per-workload-kind runtime tables.

use paas_config::WorkloadKind;

use super::IntegrationKind;

/// A built-in option with a fixed variable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameworkOption {
    /// Configuration option name.
    pub option: &'static str,
    /// Exported variable name.
    pub env: &'static str,
    /// Value used when the option is unset.
    pub default: Option<&'static str>,
}

const fn option(
    option: &'static str,
    env: &'static str,
    default: Option<&'static str>,
) -> FrameworkOption {
    FrameworkOption {
        option,
        env,
        default,
    }
}

/// An option holding a comma-separated host list that is exported as a JSON
/// array together with the base URL's host name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostListOption {
    /// Configuration option name.
    pub option: &'static str,
    /// Exported variable name.
    pub env: &'static str,
}

/// Which auxiliary services a workload kind can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSupport {
    /// Whether background workers are supported.
    pub workers: bool,
    /// Whether a periodic scheduler is supported.
    pub scheduler: bool,
    /// Worker command used when the image declares none.
    pub default_worker: Option<&'static str>,
    /// Scheduler command used when the image declares none.
    pub default_scheduler: Option<&'static str>,
}

const NO_TASKS: TaskSupport = TaskSupport {
    workers: false,
    scheduler: false,
    default_worker: None,
    default_scheduler: None,
};

/// Where the workload publishes its own metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsProfile {
    /// Variable carrying a configured metrics port.
    pub port_env: Option<&'static str>,
    /// Port scraped when none is configured.
    pub default_port: Option<u16>,
    /// Variable carrying a configured metrics path.
    pub path_env: Option<&'static str>,
    /// Path scraped when none is configured.
    pub default_path: &'static str,
}

/// Static runtime description of one workload kind.
#[derive(Debug, PartialEq, Eq)]
pub struct WorkloadProfile {
    /// Workload kind.
    pub kind: WorkloadKind,
    /// Prefix applied to user options and scoped integrations.
    pub config_prefix: &'static str,
    /// Port the web service listens on by default.
    pub port: u16,
    /// Framework option overriding [`Self::port`].
    pub port_option: Option<&'static str>,
    /// Built-in options with fixed variable names.
    pub framework_options: &'static [FrameworkOption],
    /// Host list the framework checks incoming requests against.
    pub allowed_hosts: Option<HostListOption>,
    /// Variables exported regardless of configuration.
    pub defaults: &'static [(&'static str, &'static str)],
    /// Web service command line.
    pub web_command: &'static str,
    /// Working directory of every service.
    pub working_directory: &'static str,
    /// User every service runs as.
    pub run_as_user: &'static str,
    /// Auxiliary service support.
    pub tasks: TaskSupport,
    /// Built-in metrics endpoint.
    pub metrics: MetricsProfile,
    /// Integrations the workload cannot run without.
    pub required: &'static [IntegrationKind],
    /// Integrations of which the workload needs at least one.
    pub required_any: &'static [IntegrationKind],
}

const GUNICORN_METRICS: MetricsProfile = MetricsProfile {
    port_env: None,
    default_port: Some(9102),
    path_env: None,
    default_path: "/metrics",
};

static FLASK: WorkloadProfile = WorkloadProfile {
    kind: WorkloadKind::Flask,
    config_prefix: "FLASK_",
    port: 8000,
    port_option: None,
    framework_options: &[],
    allowed_hosts: None,
    defaults: &[],
    web_command: "/bin/python3 -m gunicorn -c /flask/gunicorn.conf.py app:app",
    working_directory: "/flask/app",
    run_as_user: "_daemon_",
    tasks: TaskSupport {
        workers: true,
        scheduler: true,
        default_worker: Some("celery -A app:celery_app worker -c 2 --loglevel INFO"),
        default_scheduler: Some(
            "celery -A app:celery_app beat --loglevel INFO -s /tmp/celerybeat-schedule",
        ),
    },
    metrics: GUNICORN_METRICS,
    required: &[],
    required_any: &[],
};

static DJANGO: WorkloadProfile = WorkloadProfile {
    kind: WorkloadKind::Django,
    config_prefix: "DJANGO_",
    port: 8000,
    port_option: None,
    framework_options: &[],
    allowed_hosts: Some(HostListOption {
        option: "django-allowed-hosts",
        env: "DJANGO_ALLOWED_HOSTS",
    }),
    defaults: &[],
    web_command: "/bin/python3 -m gunicorn -c /django/gunicorn.conf.py django_app.wsgi:application",
    working_directory: "/django/app",
    run_as_user: "_daemon_",
    tasks: TaskSupport {
        workers: true,
        scheduler: true,
        default_worker: Some("celery -A django_app worker -c 2 --loglevel INFO"),
        default_scheduler: Some(
            "celery -A django_app beat --loglevel INFO -s /tmp/celerybeat-schedule",
        ),
    },
    metrics: GUNICORN_METRICS,
    required: &[],
    required_any: &[
        IntegrationKind::Postgresql,
        IntegrationKind::Mysql,
        IntegrationKind::Mongodb,
    ],
};

static FASTAPI: WorkloadProfile = WorkloadProfile {
    kind: WorkloadKind::Fastapi,
    config_prefix: "APP_",
    port: 8080,
    port_option: Some("app-port"),
    framework_options: &[option("app-port", "UVICORN_PORT", Some("8080"))],
    allowed_hosts: None,
    defaults: &[("UVICORN_HOST", "0.0.0.0")],
    web_command: "/bin/python3 -m uvicorn app:app",
    working_directory: "/app",
    run_as_user: "_daemon_",
    tasks: TaskSupport {
        workers: true,
        scheduler: true,
        default_worker: None,
        default_scheduler: None,
    },
    metrics: GUNICORN_METRICS,
    required: &[],
    required_any: &[],
};

static GO: WorkloadProfile = WorkloadProfile {
    kind: WorkloadKind::Go,
    config_prefix: "APP_",
    port: 8080,
    port_option: Some("app-port"),
    framework_options: &[
        option("app-port", "APP_PORT", Some("8080")),
        option("metrics-port", "APP_METRICS_PORT", None),
        option("metrics-path", "APP_METRICS_PATH", None),
        option("app-secret-key", "APP_SECRET_KEY", None),
    ],
    allowed_hosts: None,
    defaults: &[],
    web_command: "/usr/local/bin/app",
    working_directory: "/app",
    run_as_user: "_daemon_",
    tasks: NO_TASKS,
    metrics: MetricsProfile {
        port_env: Some("APP_METRICS_PORT"),
        default_port: None,
        path_env: Some("APP_METRICS_PATH"),
        default_path: "/metrics",
    },
    required: &[],
    required_any: &[],
};

static EXPRESSJS: WorkloadProfile = WorkloadProfile {
    kind: WorkloadKind::Expressjs,
    config_prefix: "APP_",
    port: 8080,
    port_option: Some("port"),
    framework_options: &[
        option("port", "PORT", Some("8080")),
        option("node-env", "NODE_ENV", Some("production")),
        option("metrics-port", "METRICS_PORT", None),
        option("metrics-path", "METRICS_PATH", None),
        option("app-secret-key", "APP_SECRET_KEY", None),
    ],
    allowed_hosts: None,
    defaults: &[],
    web_command: "npm start",
    working_directory: "/app",
    run_as_user: "_daemon_",
    tasks: NO_TASKS,
    metrics: MetricsProfile {
        port_env: Some("METRICS_PORT"),
        default_port: None,
        path_env: Some("METRICS_PATH"),
        default_path: "/metrics",
    },
    required: &[],
    required_any: &[],
};

static SPRING_BOOT: WorkloadProfile = WorkloadProfile {
    kind: WorkloadKind::SpringBoot,
    config_prefix: "APP_",
    port: 8080,
    port_option: Some("app-port"),
    framework_options: &[
        option("app-port", "SERVER_PORT", Some("8080")),
        option("metrics-port", "SERVER_METRICS_PORT", Some("8080")),
        option("metrics-path", "SERVER_METRICS_PATH", Some("/metrics")),
        option("app-secret-key", "APP_SECRET_KEY", None),
    ],
    allowed_hosts: None,
    defaults: &[],
    web_command: "java -jar /app/app.jar",
    working_directory: "/app",
    run_as_user: "_daemon_",
    tasks: NO_TASKS,
    metrics: MetricsProfile {
        port_env: Some("SERVER_METRICS_PORT"),
        default_port: None,
        path_env: Some("SERVER_METRICS_PATH"),
        default_path: "/metrics",
    },
    required: &[],
    required_any: &[],
};

impl WorkloadProfile {
    /// Returns the static profile for `kind`.
    #[must_use]
    pub const fn for_kind(kind: WorkloadKind) -> &'static Self {
        match kind {
            WorkloadKind::Flask => &FLASK,
            WorkloadKind::Django => &DJANGO,
            WorkloadKind::Fastapi => &FASTAPI,
            WorkloadKind::Go => &GO,
            WorkloadKind::Expressjs => &EXPRESSJS,
            WorkloadKind::SpringBoot => &SPRING_BOOT,
        }
    }

    /// Finds the built-in option named `name`.
    #[must_use]
    pub fn framework_option(&self, name: &str) -> Option<&'static FrameworkOption> {
        self.framework_options
            .iter()
            .find(|candidate| candidate.option == name)
    }
}
