//! Field schemas for every integration kind.

use super::{
    DerivedEnv, FieldShape, FieldSpec, IntegrationKind, IntegrationSchema, UriSource, UriTemplate,
};

const DATABASE_FIELDS: &[FieldSpec] = &[
    FieldSpec::internal("endpoints").with_shape(FieldShape::FirstListItem),
    FieldSpec::internal("username"),
    FieldSpec::internal("password"),
    FieldSpec::internal("database"),
];

const fn database_uri(scheme: &'static str, default_port: u16) -> UriSource {
    UriSource::Compose(UriTemplate {
        scheme,
        default_port,
        host: "endpoints",
        username: "username",
        password: "password",
        path: Some("database"),
        encode_path: false,
        exports_name: true,
    })
}

static POSTGRESQL: IntegrationSchema = IntegrationSchema {
    env_prefix: "POSTGRESQL_DB_",
    scoped: false,
    task_broker: false,
    max_instances: 1,
    fields: DATABASE_FIELDS,
    uri: database_uri("postgresql", 5432),
    derived: &[],
};

static MYSQL: IntegrationSchema = IntegrationSchema {
    env_prefix: "MYSQL_DB_",
    scoped: false,
    task_broker: false,
    max_instances: 1,
    fields: DATABASE_FIELDS,
    uri: database_uri("mysql", 3306),
    derived: &[],
};

static MONGODB: IntegrationSchema = IntegrationSchema {
    env_prefix: "MONGO_DB_",
    scoped: false,
    task_broker: false,
    max_instances: 1,
    fields: DATABASE_FIELDS,
    uri: database_uri("mongodb", 27017),
    derived: &[],
};

static REDIS: IntegrationSchema = IntegrationSchema {
    env_prefix: "REDIS_DB_",
    scoped: false,
    task_broker: true,
    max_instances: 1,
    fields: &[FieldSpec::internal("url").with_shape(FieldShape::Url)],
    uri: UriSource::FromField("url"),
    derived: &[],
};

static RABBITMQ: IntegrationSchema = IntegrationSchema {
    env_prefix: "RABBITMQ_",
    scoped: false,
    task_broker: true,
    max_instances: 16,
    fields: &[
        FieldSpec::internal("hostname"),
        FieldSpec::internal("username"),
        FieldSpec::internal("password"),
        FieldSpec::optional("vhost", "VHOST"),
    ],
    uri: UriSource::Compose(UriTemplate {
        scheme: "amqp",
        default_port: 5672,
        host: "hostname",
        username: "username",
        password: "password",
        path: Some("vhost"),
        encode_path: true,
        exports_name: false,
    }),
    derived: &[],
};

static S3: IntegrationSchema = IntegrationSchema {
    env_prefix: "S3_",
    scoped: false,
    task_broker: false,
    max_instances: 1,
    fields: &[
        FieldSpec::mandatory("access-key", "ACCESS_KEY"),
        FieldSpec::mandatory("secret-key", "SECRET_KEY"),
        FieldSpec::mandatory("bucket", "BUCKET"),
        FieldSpec::optional("region", "REGION"),
        FieldSpec::optional("storage-class", "STORAGE_CLASS"),
        FieldSpec::optional("endpoint", "ENDPOINT"),
        FieldSpec::optional("path", "PATH"),
        FieldSpec::optional("s3-api-version", "API_VERSION"),
        FieldSpec::optional("s3-uri-style", "URI_STYLE"),
        FieldSpec::optional("tls-ca-chain", "TLS_CA_CHAIN"),
        FieldSpec::optional("attributes", "ATTRIBUTES"),
    ],
    uri: UriSource::None,
    derived: &[DerivedEnv::Translate {
        env: "ADDRESSING_STYLE",
        from: "s3-uri-style",
        table: &[("host", "virtual"), ("path", "path")],
    }],
};

static SAML: IntegrationSchema = IntegrationSchema {
    env_prefix: "SAML_",
    scoped: false,
    task_broker: false,
    max_instances: 1,
    fields: &[
        FieldSpec::mandatory("entity_id", "ENTITY_ID"),
        FieldSpec::optional("metadata_url", "METADATA_URL"),
        FieldSpec::mandatory("x509certs", "SIGNING_CERTIFICATE")
            .with_shape(FieldShape::FirstListItem),
        FieldSpec::mandatory(
            "single_sign_on_service_redirect_url",
            "SINGLE_SIGN_ON_REDIRECT_URL",
        ),
    ],
    uri: UriSource::None,
    derived: &[],
};

static OIDC: IntegrationSchema = IntegrationSchema {
    env_prefix: "OIDC_",
    scoped: true,
    task_broker: false,
    max_instances: 1,
    fields: &[
        FieldSpec::mandatory("client_id", "CLIENT_ID"),
        FieldSpec::mandatory("client_secret", "CLIENT_SECRET"),
        FieldSpec::mandatory("issuer_url", "API_BASE_URL"),
        FieldSpec::mandatory("authorization_endpoint", "AUTHORIZE_URL"),
        FieldSpec::mandatory("token_endpoint", "ACCESS_TOKEN_URL"),
        FieldSpec::mandatory("userinfo_endpoint", "USER_URL"),
        FieldSpec::mandatory("jwks_endpoint", "JWKS_URL"),
        FieldSpec::optional("scope", "SCOPES"),
    ],
    uri: UriSource::None,
    derived: &[DerivedEnv::ScopeKwargs {
        env: "CLIENT_KWARGS",
        from: "scope",
    }],
};

static SMTP: IntegrationSchema = IntegrationSchema {
    env_prefix: "SMTP_",
    scoped: false,
    task_broker: false,
    max_instances: 1,
    fields: &[
        FieldSpec::mandatory("host", "HOST"),
        FieldSpec::mandatory("port", "PORT").with_shape(FieldShape::Port),
        FieldSpec::optional("user", "USER"),
        FieldSpec::optional("password", "PASSWORD"),
        FieldSpec::optional("auth_type", "AUTH_TYPE").with_shape(FieldShape::NoneIsAbsent),
        FieldSpec::optional("transport_security", "TRANSPORT_SECURITY")
            .with_shape(FieldShape::NoneIsAbsent),
        FieldSpec::optional("domain", "DOMAIN"),
        FieldSpec::optional("skip_ssl_verify", "SKIP_SSL_VERIFY"),
    ],
    uri: UriSource::None,
    derived: &[],
};

static TRACING: IntegrationSchema = IntegrationSchema {
    env_prefix: "OTEL_",
    scoped: false,
    task_broker: false,
    max_instances: 1,
    fields: &[FieldSpec::mandatory("endpoint", "EXPORTER_OTLP_ENDPOINT")],
    uri: UriSource::None,
    derived: &[DerivedEnv::ServiceName {
        env: "SERVICE_NAME",
    }],
};

static OPENFGA: IntegrationSchema = IntegrationSchema {
    env_prefix: "FGA_",
    scoped: false,
    task_broker: false,
    max_instances: 1,
    fields: &[
        FieldSpec::mandatory("store_id", "STORE_ID"),
        FieldSpec::mandatory("token", "TOKEN"),
        FieldSpec::mandatory("http_api_url", "HTTP_API_URL"),
        FieldSpec::optional("grpc_api_url", "GRPC_API_URL"),
    ],
    uri: UriSource::None,
    derived: &[],
};

static INGRESS: IntegrationSchema = IntegrationSchema {
    env_prefix: "",
    scoped: true,
    task_broker: false,
    max_instances: 1,
    fields: &[FieldSpec::mandatory("url", "BASE_URL")],
    uri: UriSource::None,
    derived: &[],
};

/// Returns the static schema for `kind`.
pub(super) const fn schema(kind: IntegrationKind) -> &'static IntegrationSchema {
    match kind {
        IntegrationKind::Postgresql => &POSTGRESQL,
        IntegrationKind::Mysql => &MYSQL,
        IntegrationKind::Mongodb => &MONGODB,
        IntegrationKind::Redis => &REDIS,
        IntegrationKind::Rabbitmq => &RABBITMQ,
        IntegrationKind::S3 => &S3,
        IntegrationKind::Saml => &SAML,
        IntegrationKind::Oidc => &OIDC,
        IntegrationKind::Smtp => &SMTP,
        IntegrationKind::Tracing => &TRACING,
        IntegrationKind::Openfga => &OPENFGA,
        IntegrationKind::Ingress => &INGRESS,
    }
}
