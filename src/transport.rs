use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};

use crate::config::Config;

const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum TransportConfigError {
    #[error("Unsupported mail provider '{0}'")]
    UnknownProvider(String),

    #[error("Mail account username and password must be set")]
    MissingCredentials,

    #[error("Failed to set up TLS for SMTP relay: {0}")]
    Tls(#[source] lettre::transport::smtp::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Refusal from a transport that does not report through SMTP replies.
    /// lettre's SMTP client already turns negative replies into `Smtp`.
    #[cfg_attr(not(test), allow(dead_code))]
    #[error("Provider rejected message: {0}")]
    Rejected(String),
}

/// A handle able to submit one message to the provider.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submits the message and returns the provider-side message id.
    async fn send(&self, message: Message) -> Result<String, DeliveryError>;
}

pub trait TransportFactory: Send + Sync {
    fn create_transporter(&self) -> Result<Box<dyn MailTransport>, TransportConfigError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    fn implicit_tls(&self) -> bool {
        self.port == IMPLICIT_TLS_PORT
    }
}

/// Maps a provider identifier to its SMTP endpoint. Identifiers containing a
/// dot are taken as host names.
fn resolve_endpoint(service: &str, port: Option<u16>) -> Result<Endpoint, TransportConfigError> {
    let service = service.trim();
    let (host, default_port) = match service.to_ascii_lowercase().as_str() {
        "gmail" | "googlemail" => ("smtp.gmail.com", 465),
        "yandex" => ("smtp.yandex.ru", 465),
        "mail.ru" | "mailru" => ("smtp.mail.ru", 465),
        "outlook" | "hotmail" | "outlook365" => ("smtp-mail.outlook.com", 587),
        "office365" => ("smtp.office365.com", 587),
        "yahoo" => ("smtp.mail.yahoo.com", 465),
        "icloud" => ("smtp.mail.me.com", 587),
        "zoho" => ("smtp.zoho.com", 465),
        _ if service.contains('.') && !service.contains(char::is_whitespace) => {
            (service, IMPLICIT_TLS_PORT)
        }
        _ => return Err(TransportConfigError::UnknownProvider(service.to_string())),
    };

    Ok(Endpoint {
        host: host.to_string(),
        port: port.unwrap_or(default_port),
    })
}

pub struct SmtpTransportFactory {
    service: String,
    port: Option<u16>,
    username: String,
    password: String,
    accept_invalid_certs: bool,
}

impl SmtpTransportFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            service: config.email_service.clone(),
            port: config.email_port,
            username: config.email_user.clone(),
            password: config.email_password.clone(),
            accept_invalid_certs: config.email_tls_accept_invalid_certs,
        }
    }
}

impl TransportFactory for SmtpTransportFactory {
    fn create_transporter(&self) -> Result<Box<dyn MailTransport>, TransportConfigError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(TransportConfigError::MissingCredentials);
        }

        let endpoint = resolve_endpoint(&self.service, self.port)?;

        let tls_params = TlsParameters::builder(endpoint.host.clone())
            .dangerous_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(TransportConfigError::Tls)?;
        let tls = if endpoint.implicit_tls() {
            Tls::Wrapper(tls_params)
        } else {
            Tls::Required(tls_params)
        };

        let creds = Credentials::new(self.username.clone(), self.password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&endpoint.host)
            .port(endpoint.port)
            .tls(tls)
            .credentials(creds)
            .build();

        tracing::debug!(
            "Created SMTP transport for {}:{}",
            endpoint.host,
            endpoint.port
        );

        Ok(Box::new(SmtpMailTransport { mailer }))
    }
}

struct SmtpMailTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: Message) -> Result<String, DeliveryError> {
        let message_id = message.headers().get_raw("Message-ID").map(str::to_string);

        let response = self.mailer.send(message).await?;

        Ok(message_id.unwrap_or_else(|| response.message().collect::<Vec<_>>().join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(service: &str, user: &str, password: &str) -> Config {
        Config {
            email_service: service.to_string(),
            email_user: user.to_string(),
            email_password: password.to_string(),
            email_from: None,
            email_port: None,
            email_tls_accept_invalid_certs: true,
            port: 3000,
            api_key: "secret123".to_string(),
        }
    }

    #[test]
    fn well_known_providers_resolve() {
        let gmail = resolve_endpoint("Gmail", None).unwrap();
        assert_eq!(gmail.host, "smtp.gmail.com");
        assert!(gmail.implicit_tls());

        let outlook = resolve_endpoint("outlook", None).unwrap();
        assert_eq!(outlook.port, 587);
        assert!(!outlook.implicit_tls());
    }

    #[test]
    fn host_names_pass_through_with_port_override() {
        let ep = resolve_endpoint("smtp.example.com", Some(2525)).unwrap();
        assert_eq!(
            ep,
            Endpoint {
                host: "smtp.example.com".to_string(),
                port: 2525
            }
        );
        assert!(!ep.implicit_tls());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(matches!(
            resolve_endpoint("carrier-pigeon", None),
            Err(TransportConfigError::UnknownProvider(p)) if p == "carrier-pigeon"
        ));
        assert!(resolve_endpoint("", None).is_err());
    }

    #[test]
    fn factory_requires_credentials() {
        let factory = SmtpTransportFactory::new(&config("gmail", "", "hunter2"));
        assert!(matches!(
            factory.create_transporter(),
            Err(TransportConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn factory_rejects_unknown_provider() {
        let factory = SmtpTransportFactory::new(&config("nope", "bot", "hunter2"));
        assert!(matches!(
            factory.create_transporter(),
            Err(TransportConfigError::UnknownProvider(_))
        ));
    }

    #[tokio::test]
    async fn factory_builds_without_network() {
        let factory = SmtpTransportFactory::new(&config("gmail", "bot@gmail.com", "hunter2"));
        assert!(factory.create_transporter().is_ok());
    }
}
