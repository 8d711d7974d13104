// Credential gate: register or log in before the posture detector may start.
//
//   Start --(store empty)--> FirstUserRegistration --> Ready
//   Start --(store has users)--> ChoicePrompt --> LoginFlow | RegisterFlow --> Ready
//
// Failed logins and registrations return to ChoicePrompt with no attempt limit.
// Only a store failure during Start is fatal.

use super::credentials::CredentialStore;
use super::password::PasswordHasher;
use super::prompt::Prompt;
use crate::models::credential::{AuthError, AuthResult, Credential, GateState, SessionState};
use log::{debug, info, warn};

pub const USERNAME_PROMPT: &str = "Username: ";
pub const PASSWORD_PROMPT: &str = "Password: ";
pub const CHOICE_PROMPT: &str = "Are you already registered? (s/n): ";

/// How the gate finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The user is authenticated; the frame loop may start
    Ready(Credential),
    /// Registering the very first user failed; the detector must not start
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    AlreadyRegistered,
    NotRegistered,
}

fn parse_choice(input: &str) -> Option<Choice> {
    match input.trim().to_lowercase().as_str() {
        "s" | "si" | "y" | "yes" => Some(Choice::AlreadyRegistered),
        "n" | "no" => Some(Choice::NotRegistered),
        _ => None,
    }
}

pub struct CredentialGate<'a, S: ?Sized, P: ?Sized, H: ?Sized> {
    store: &'a S,
    prompt: &'a mut P,
    hasher: &'a H,
    session: SessionState,
    authenticated: Option<Credential>,
    history: Vec<GateState>,
}

impl<'a, S, P, H> CredentialGate<'a, S, P, H>
where
    S: CredentialStore + ?Sized,
    P: Prompt + ?Sized,
    H: PasswordHasher + ?Sized,
{
    pub fn new(store: &'a S, prompt: &'a mut P, hasher: &'a H) -> Self {
        Self {
            store,
            prompt,
            hasher,
            session: SessionState::Unauthenticated,
            authenticated: None,
            history: Vec::new(),
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.session
    }

    /// Every state entered so far, in order
    pub fn history(&self) -> &[GateState] {
        &self.history
    }

    /// Drive the state machine until `Ready` or termination.
    ///
    /// Errors: a store failure while counting users at `Start`, or the prompt
    /// input closing. Everything else is reported to the user and re-prompted.
    pub async fn run(&mut self) -> AuthResult<GateOutcome> {
        let mut state = GateState::Start;

        loop {
            debug!("Credential gate entering {:?}", state);
            self.history.push(state);

            state = match state {
                GateState::Start => self.start().await?,
                GateState::FirstUserRegistration => {
                    self.prompt
                        .tell("No users registered yet; registering the first user.");
                    if !self.register().await? {
                        self.session = SessionState::Failed;
                        self.prompt
                            .tell("Could not register the user. Check the details and start again.");
                        return Ok(GateOutcome::Terminated);
                    }
                    GateState::Ready
                }
                GateState::ChoicePrompt => self.choose()?,
                GateState::LoginFlow => {
                    if self.login().await? {
                        GateState::Ready
                    } else {
                        self.session = SessionState::Unauthenticated;
                        GateState::ChoicePrompt
                    }
                }
                GateState::RegisterFlow => {
                    if self.register().await? {
                        GateState::Ready
                    } else {
                        self.session = SessionState::Unauthenticated;
                        GateState::ChoicePrompt
                    }
                }
                GateState::Ready => {
                    let credential = self
                        .authenticated
                        .take()
                        .ok_or(AuthError::InvalidCredentials)?;
                    self.session = SessionState::Authenticated;
                    info!("User {} authenticated", credential.username);
                    return Ok(GateOutcome::Ready(credential));
                }
            };
        }
    }

    async fn start(&mut self) -> AuthResult<GateState> {
        let count = self.store.count_credentials().await?;
        debug!("Credential store holds {} users", count);

        Ok(if count == 0 {
            GateState::FirstUserRegistration
        } else {
            GateState::ChoicePrompt
        })
    }

    fn choose(&mut self) -> AuthResult<GateState> {
        loop {
            let answer = self.prompt.ask(CHOICE_PROMPT)?;
            match parse_choice(&answer) {
                Some(Choice::AlreadyRegistered) => return Ok(GateState::LoginFlow),
                Some(Choice::NotRegistered) => return Ok(GateState::RegisterFlow),
                None => self.prompt.tell("Please answer 's' or 'n'."),
            }
        }
    }

    fn read_username_and_password(&mut self) -> AuthResult<(String, String)> {
        let username = self.prompt.ask(USERNAME_PROMPT)?;
        let password = self.prompt.ask(PASSWORD_PROMPT)?;
        Ok((username, password))
    }

    /// Returns `Ok(false)` when the user should be sent back to choose again
    async fn login(&mut self) -> AuthResult<bool> {
        self.session = SessionState::Authenticating;
        let (username, password) = self.read_username_and_password()?;
        let password_hash = self.hasher.hash(&password);

        let result = match self.store.verify_credential(&username, &password_hash).await {
            Ok(Some(credential)) => Ok(credential),
            Ok(None) => Err(AuthError::InvalidCredentials),
            Err(e) => Err(e),
        };

        match result {
            Ok(mut credential) => {
                let now = chrono::Utc::now().timestamp();
                match self.store.touch_last_login(&credential.id, now).await {
                    Ok(()) => credential.last_login = Some(now),
                    Err(e) => warn!("Could not record last login for {}: {}", username, e),
                }

                self.prompt.tell("Login successful.");
                self.authenticated = Some(credential);
                Ok(true)
            }
            Err(e) if e.is_recoverable() => {
                warn!("Login failed for {}: {}", username, e);
                self.prompt
                    .tell(&format!("Could not log in ({}). Please try again.", e));
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns `Ok(false)` when registration did not succeed
    async fn register(&mut self) -> AuthResult<bool> {
        self.session = SessionState::Registering;
        let (username, password) = self.read_username_and_password()?;
        let password_hash = self.hasher.hash(&password);

        match self.store.create_credential(&username, &password_hash).await {
            Ok(credential) => {
                self.prompt.tell("User registered successfully.");
                self.authenticated = Some(credential);
                Ok(true)
            }
            Err(AuthError::DuplicateUsername(name)) => {
                warn!("Registration rejected: {} already exists", name);
                self.prompt
                    .tell("That username already exists. Try logging in.");
                Ok(false)
            }
            Err(e) if e.is_recoverable() => {
                warn!("Registration of {} failed: {}", username, e);
                self.prompt.tell(&format!("Could not register ({}).", e));
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::CredentialManager;
    use crate::core::database::Database;
    use crate::core::password::Sha256Hasher;
    use crate::core::prompt::ScriptedPrompt;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::Mutex;

    use GateState::*;

    async fn setup_test_store() -> CredentialManager {
        let db = Database::open("sqlite::memory:", 1)
            .await
            .expect("Failed to create in-memory database");
        CredentialManager::new(Arc::new(db))
    }

    async fn store_with_alice() -> CredentialManager {
        let store = setup_test_store().await;
        store
            .create_credential("alice", &Sha256Hasher.hash("secret"))
            .await
            .expect("Failed to seed credential");
        store
    }

    fn choice_prompts(prompt: &ScriptedPrompt) -> usize {
        prompt.questions.iter().filter(|q| *q == CHOICE_PROMPT).count()
    }

    #[tokio::test]
    async fn test_empty_store_registers_first_user_without_login() {
        let store = setup_test_store().await;
        let mut prompt = ScriptedPrompt::new(["alice", "secret"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let outcome = gate.run().await.expect("gate should finish");

        assert_eq!(gate.history(), &[Start, FirstUserRegistration, Ready]);
        assert_eq!(gate.session_state(), SessionState::Authenticated);
        match outcome {
            GateOutcome::Ready(credential) => {
                assert_eq!(credential.username, "alice");
                assert!(credential.last_login.is_none(), "no login step after registration");
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        assert_eq!(choice_prompts(&prompt), 0);
        assert_eq!(prompt.questions, vec![USERNAME_PROMPT, PASSWORD_PROMPT]);
        assert_eq!(store.count_credentials().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_returns_to_choice_without_mutation() {
        let store = store_with_alice().await;
        let before = store.find_credential("alice").await.unwrap().unwrap();
        let mut prompt = ScriptedPrompt::new(["s", "alice", "wrong"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let result = gate.run().await;

        // The gate keeps waiting for another choice until input runs out
        assert!(matches!(result, Err(AuthError::PromptClosed)));
        assert_eq!(gate.history(), &[Start, ChoicePrompt, LoginFlow, ChoicePrompt]);
        assert_eq!(gate.session_state(), SessionState::Unauthenticated);

        let after = store.find_credential("alice").await.unwrap().unwrap();
        assert_eq!(before, after);
        assert_eq!(store.count_credentials().await.unwrap(), 1);
        assert_eq!(choice_prompts(&prompt), 2);
    }

    #[tokio::test]
    async fn test_login_retry_then_success_stamps_last_login() {
        let store = store_with_alice().await;
        let mut prompt = ScriptedPrompt::new(["s", "alice", "wrong", "s", "alice", "secret"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let outcome = gate.run().await.expect("gate should finish");

        assert_eq!(
            gate.history(),
            &[Start, ChoicePrompt, LoginFlow, ChoicePrompt, LoginFlow, Ready]
        );
        let GateOutcome::Ready(credential) = outcome else {
            panic!("expected Ready");
        };
        assert!(credential.last_login.is_some());

        let stored = store.find_credential("alice").await.unwrap().unwrap();
        assert_eq!(stored.last_login, credential.last_login);
    }

    #[tokio::test]
    async fn test_duplicate_username_returns_to_choice() {
        let store = store_with_alice().await;
        let mut prompt = ScriptedPrompt::new(["n", "alice", "other"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let result = gate.run().await;

        assert!(matches!(result, Err(AuthError::PromptClosed)));
        assert_eq!(gate.history(), &[Start, ChoicePrompt, RegisterFlow, ChoicePrompt]);
        assert!(prompt.messages.iter().any(|m| m.contains("already exists")));

        assert_eq!(store.count_credentials().await.unwrap(), 1);
        let stored = store.find_credential("alice").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, Sha256Hasher.hash("secret"));
    }

    #[tokio::test]
    async fn test_self_registration_is_ready_without_login() {
        let store = store_with_alice().await;
        let mut prompt = ScriptedPrompt::new(["n", "bob", "hunter2"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let outcome = gate.run().await.expect("gate should finish");

        assert_eq!(gate.history(), &[Start, ChoicePrompt, RegisterFlow, Ready]);
        assert!(matches!(outcome, GateOutcome::Ready(ref c) if c.username == "bob"));
        assert_eq!(store.count_credentials().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unrecognized_choice_reprompts() {
        let store = store_with_alice().await;
        let mut prompt = ScriptedPrompt::new(["x", "", "maybe", " S ", "alice", "secret"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let outcome = gate.run().await.expect("gate should finish");

        assert!(matches!(outcome, GateOutcome::Ready(_)));
        // Re-prompting stays inside a single ChoicePrompt state
        assert_eq!(gate.history(), &[Start, ChoicePrompt, LoginFlow, Ready]);
        assert_eq!(choice_prompts(&prompt), 4);
        assert_eq!(
            prompt.messages.iter().filter(|m| m.contains("'s' or 'n'")).count(),
            3
        );
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("s"), Some(Choice::AlreadyRegistered));
        assert_eq!(parse_choice("  Y\n"), Some(Choice::AlreadyRegistered));
        assert_eq!(parse_choice("N"), Some(Choice::NotRegistered));
        assert_eq!(parse_choice("no"), Some(Choice::NotRegistered));
        assert_eq!(parse_choice(""), None);
        assert_eq!(parse_choice("sn"), None);
    }

    // ==========================================================================
    // Store doubles for failure paths
    // ==========================================================================

    #[derive(Default)]
    struct StubStore {
        count: i64,
        count_fails: bool,
        create_fails: bool,
        verify_fails: bool,
        touch_fails: bool,
        touched: Mutex<Vec<String>>,
    }

    fn stub_credential(username: &str) -> Credential {
        Credential {
            id: "stub-id".to_string(),
            username: username.to_string(),
            password_hash: String::new(),
            last_login: None,
            created_at: 0,
        }
    }

    #[async_trait]
    impl CredentialStore for StubStore {
        async fn count_credentials(&self) -> AuthResult<i64> {
            if self.count_fails {
                return Err(AuthError::StoreUnavailable("connection refused".into()));
            }
            Ok(self.count)
        }

        async fn find_credential(&self, _username: &str) -> AuthResult<Option<Credential>> {
            Ok(None)
        }

        async fn create_credential(&self, username: &str, _password_hash: &str) -> AuthResult<Credential> {
            if self.create_fails {
                return Err(AuthError::StoreUnavailable("connection refused".into()));
            }
            Ok(stub_credential(username))
        }

        async fn verify_credential(&self, username: &str, _password_hash: &str) -> AuthResult<Option<Credential>> {
            if self.verify_fails {
                return Err(AuthError::StoreUnavailable("connection refused".into()));
            }
            Ok(Some(stub_credential(username)))
        }

        async fn touch_last_login(&self, credential_id: &str, _timestamp: i64) -> AuthResult<()> {
            if self.touch_fails {
                return Err(AuthError::DatabaseError("disk I/O error".into()));
            }
            self.touched.lock().unwrap().push(credential_id.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_unavailable_at_start_is_fatal() {
        let store = StubStore {
            count_fails: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::new(["s", "alice", "secret"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let result = gate.run().await;

        assert!(matches!(result, Err(AuthError::StoreUnavailable(_))));
        assert_eq!(gate.history(), &[Start]);
        assert!(prompt.questions.is_empty());
    }

    #[tokio::test]
    async fn test_first_registration_failure_terminates_gate() {
        let store = StubStore {
            count: 0,
            create_fails: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::new(["alice", "secret", "s"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let outcome = gate.run().await.expect("termination is not an error");

        assert_eq!(outcome, GateOutcome::Terminated);
        assert_eq!(gate.session_state(), SessionState::Failed);
        assert_eq!(gate.history(), &[Start, FirstUserRegistration]);
        // Not retried
        assert_eq!(prompt.remaining(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_during_login_is_absorbed() {
        let store = StubStore {
            count: 1,
            verify_fails: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::new(["s", "alice", "secret"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let result = gate.run().await;

        assert!(matches!(result, Err(AuthError::PromptClosed)));
        assert_eq!(gate.history(), &[Start, ChoicePrompt, LoginFlow, ChoicePrompt]);
    }

    #[tokio::test]
    async fn test_store_failure_during_registration_is_absorbed() {
        let store = StubStore {
            count: 1,
            create_fails: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::new(["n", "bob", "hunter2"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let result = gate.run().await;

        assert!(matches!(result, Err(AuthError::PromptClosed)));
        assert_eq!(gate.history(), &[Start, ChoicePrompt, RegisterFlow, ChoicePrompt]);
        assert_eq!(gate.session_state(), SessionState::Unauthenticated);
        assert!(prompt
            .messages
            .iter()
            .any(|m| m.starts_with("Could not register")));
    }

    #[tokio::test]
    async fn test_last_login_failure_does_not_fail_login() {
        let store = StubStore {
            count: 1,
            touch_fails: true,
            ..Default::default()
        };
        let mut prompt = ScriptedPrompt::new(["s", "alice", "secret"]);
        let hasher = Sha256Hasher;

        let mut gate = CredentialGate::new(&store, &mut prompt, &hasher);
        let outcome = gate.run().await.expect("login should still succeed");

        let GateOutcome::Ready(credential) = outcome else {
            panic!("expected Ready");
        };
        assert!(credential.last_login.is_none());
        assert!(store.touched.lock().unwrap().is_empty());
    }
}
