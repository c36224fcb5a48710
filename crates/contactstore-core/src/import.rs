//! Import orchestration.
//!
//! Resolves the provider for an address, runs one retrieval under the
//! admission limit, and collects the deduplicated contact list.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::collector::{contact_lines, unique_contacts};
use crate::config::ImporterConfig;
use crate::contact::Contact;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::provider::{ProviderId, ProviderPolicy, resolve_with};
use crate::runner::{ProcessRunner, Retrieve};

/// Entry point for address book imports.
///
/// Cloning an `Importer` shares its admission limit.
#[derive(Debug, Clone)]
pub struct Importer<R = ProcessRunner> {
    retriever: R,
    policy: ProviderPolicy,
    permits: Arc<Semaphore>,
}

impl Importer<ProcessRunner> {
    /// Creates an importer that runs the configured retrieval program.
    #[must_use]
    pub fn from_config(config: &ImporterConfig) -> Self {
        Self::new(ProcessRunner::from_config(config))
            .with_policy(config.provider_policy)
            .with_max_concurrent(config.max_concurrent)
    }
}

impl<R: Retrieve> Importer<R> {
    /// Creates an importer around a retriever, with permissive provider
    /// lookup and a single concurrent retrieval.
    #[must_use]
    pub fn new(retriever: R) -> Self {
        Self {
            retriever,
            policy: ProviderPolicy::default(),
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    /// Sets the provider lookup policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ProviderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets how many retrievals may run at once (at least one).
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    /// Imports the address book for `email`.
    ///
    /// Returns an empty list without running anything when the address has
    /// no domain label. With `test_mode` set, the diagnostic
    /// [`TEST_LINES`](crate::TEST_LINES) are appended to the real output
    /// before collection.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedProvider`] if the label is unknown under a strict policy.
    /// - [`Error::Authentication`] if the provider rejected the credentials.
    /// - [`Error::Retrieval`] for any other retrieval failure.
    pub async fn get_contacts(
        &self,
        email: &str,
        password: &str,
        test_mode: bool,
    ) -> Result<Vec<Contact>> {
        let credentials = Credentials::new(email, password);
        let Some(provider) = resolve_with(&credentials.email, self.policy)? else {
            debug!("Skipping import for {}: no domain label", credentials.email);
            return Ok(Vec::new());
        };
        self.import_with_provider(provider, &credentials, test_mode).await
    }

    /// Imports the address book from an explicitly chosen provider.
    ///
    /// # Errors
    ///
    /// Propagates the retriever's classified error unchanged.
    pub async fn import_with_provider(
        &self,
        provider: ProviderId,
        credentials: &Credentials,
        test_mode: bool,
    ) -> Result<Vec<Contact>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::retrieval("importer is shut down"))?;

        let raw = match self.retriever.retrieve(provider, credentials).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%provider, email = %credentials.email, "Import failed: {e}");
                return Err(e);
            }
        };

        let contacts: Vec<Contact> = unique_contacts(contact_lines(&raw, test_mode)).collect();
        info!(
            %provider,
            email = %credentials.email,
            count = contacts.len(),
            "Imported contacts"
        );
        Ok(contacts)
    }
}

/// Imports the address book for `email` using the default configuration.
///
/// # Errors
///
/// See [`Importer::get_contacts`].
pub async fn get_contacts(
    email: &str,
    password: &str,
    test_mode: bool,
) -> Result<Vec<Contact>> {
    Importer::from_config(&ImporterConfig::default())
        .get_contacts(email, password, test_mode)
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::runner::{ProcessOutput, classify};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Retriever that replays canned standard output through classification.
    #[derive(Debug, Default)]
    struct CannedRetriever {
        stdout: String,
        calls: Mutex<Vec<(ProviderId, String)>>,
    }

    impl CannedRetriever {
        fn new(stdout: &str) -> Self {
            Self {
                stdout: stdout.to_string(),
                ..Self::default()
            }
        }
    }

    impl Retrieve for CannedRetriever {
        async fn retrieve(
            &self,
            provider: ProviderId,
            credentials: &Credentials,
        ) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((provider, credentials.email.clone()));
            let output = ProcessOutput {
                pid: 7,
                status: Some(0),
                stdout: self.stdout.clone(),
                stderr: String::new(),
            };
            classify(output, &credentials.email)
        }
    }

    const SCENARIO: &str = "nic@one,
nic@woomeduplicate.com,nic
nic@woomeduplicate.com,nicholas
asadlkqjcbqjbk
,blah
";

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let importer = Importer::new(CannedRetriever::new(SCENARIO));
        let contacts = importer
            .get_contacts("me@yahoo.com", "pw", false)
            .await
            .unwrap();
        assert_eq!(
            contacts,
            vec![
                Contact::new("nic@one", ""),
                Contact::new("nic@woomeduplicate.com", "nic"),
            ]
        );
    }

    #[tokio::test]
    async fn test_resolved_provider_passed_to_retriever() {
        let importer = Importer::new(CannedRetriever::new(""));
        importer
            .get_contacts("me@live.com", "pw", false)
            .await
            .unwrap();
        importer
            .get_contacts("me@googlemail.com", "pw", false)
            .await
            .unwrap();
        let calls = importer.retriever.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                (ProviderId::Hotmail, "me@live.com".to_string()),
                (ProviderId::Gmail, "me@gmail.com".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_test_mode_appends_fixture() {
        let importer = Importer::new(CannedRetriever::new("a@x.com,Ann\n"));
        let contacts = importer
            .get_contacts("me@aol.com", "pw", true)
            .await
            .unwrap();
        let emails: Vec<_> = contacts.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "nic@one", "nic@woomeduplicate.com"]);
    }

    #[tokio::test]
    async fn test_no_domain_label_skips_retrieval() {
        let importer = Importer::new(CannedRetriever::new("a@x.com,Ann\n"));
        let contacts = importer.get_contacts("nobody", "pw", false).await.unwrap();
        assert!(contacts.is_empty());
        assert!(importer.retriever.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_domain_uses_default_provider() {
        let importer = Importer::new(CannedRetriever::new(""));
        importer
            .get_contacts("me@unknownhost.io", "pw", false)
            .await
            .unwrap();
        let calls = importer.retriever.calls.lock().unwrap().clone();
        assert_eq!(calls[0].0, ProviderId::Gmail);
    }

    #[tokio::test]
    async fn test_unknown_domain_rejected_when_strict() {
        let importer =
            Importer::new(CannedRetriever::new("")).with_policy(ProviderPolicy::Strict);
        let err = importer
            .get_contacts("me@unknownhost.io", "pw", false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedProvider(_)));
        assert!(importer.retriever.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_error_propagates() {
        let importer = Importer::new(CannedRetriever::new("error:login error"));
        let err = importer
            .get_contacts("me@hotmail.com", "bad", false)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Authentication { pid: 7, ref email } if email == "me@hotmail.com"
        ));
    }

    #[tokio::test]
    async fn test_generic_error_propagates() {
        let importer = Importer::new(CannedRetriever::new("error:something else"));
        let err = importer
            .get_contacts("me@hotmail.com", "pw", false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval(ref message) if message == "something else"));
    }

    /// Retriever that records how many retrievals overlap.
    #[derive(Debug, Default)]
    struct SlowRetriever {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Retrieve for SlowRetriever {
        async fn retrieve(
            &self,
            _provider: ProviderId,
            _credentials: &Credentials,
        ) -> Result<String> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_admission_limit() {
        let importer =
            Arc::new(Importer::new(SlowRetriever::default()).with_max_concurrent(2));
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..6 {
            let importer = Arc::clone(&importer);
            tasks.spawn(async move { importer.get_contacts("me@aol.com", "pw", false).await });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }
        assert_eq!(importer.retriever.peak.load(Ordering::SeqCst), 2);
    }
}
