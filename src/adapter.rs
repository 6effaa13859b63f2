use crate::{
    config::AdapterConfig,
    error::{ConnectionError, ErrorCause, WalletError, WalletErrorKind},
    event::{Event, EventEmitter, Listener, ListenerId},
    solana::{
        BlockhashConfig, Connection, LegacyTransaction, PublicKey, SendOptions,
        SendTransactionOptions, Signature, Transaction, TransactionVersion, WalletIdentity,
    },
    wallet::{Platform, ProviderEvent, ProviderEventKind, WalletProvider, connect_redirect_url},
};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};
use tracing::{debug, info, warn};

pub const WALLET_NAME: &str = "TrashPack";
pub const WALLET_URL: &str = "https://trashpack.tech";
pub const WALLET_ICON: &str = include_str!("../assets/trashpack-icon.txt");

const SUPPORTED_TRANSACTION_VERSIONS: [TransactionVersion; 2] =
    [TransactionVersion::Legacy, TransactionVersion::V0];

/// Availability of the wallet in the current environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadyState {
    /// there is no page the wallet could be injected in
    Unsupported,
    NotDetected,
    /// not injected, but connecting redirects to the wallet's page
    Loadable,
    Installed,
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "Unsupported"),
            Self::NotDetected => write!(f, "NotDetected"),
            Self::Loadable => write!(f, "Loadable"),
            Self::Installed => write!(f, "Installed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    Connect(PublicKey),
    Disconnect,
    Error(WalletError),
    ReadyStateChange(ReadyState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AdapterEventKind {
    Connect,
    Disconnect,
    Error,
    ReadyStateChange,
}

impl Event for AdapterEvent {
    type Kind = AdapterEventKind;

    fn kind(&self) -> AdapterEventKind {
        match self {
            Self::Connect(_) => AdapterEventKind::Connect,
            Self::Disconnect => AdapterEventKind::Disconnect,
            Self::Error(_) => AdapterEventKind::Error,
            Self::ReadyStateChange(_) => AdapterEventKind::ReadyStateChange,
        }
    }
}

/// The bound wallet, the public key and our subscriptions to the wallet's
/// notifications only ever exist together.
struct Session<W> {
    wallet: W,
    public_key: PublicKey,
    on_disconnect: ListenerId,
    on_account_changed: ListenerId,
}

impl<W: WalletProvider> Session<W> {
    fn unsubscribe(&self) {
        self.wallet
            .off(ProviderEventKind::Disconnect, self.on_disconnect);
        self.wallet
            .off(ProviderEventKind::AccountChanged, self.on_account_changed);
    }
}

struct Inner<P: Platform> {
    platform: P,
    config: AdapterConfig,
    ready_state: Cell<ReadyState>,
    connecting: Cell<bool>,
    session: RefCell<Option<Session<P::Wallet>>>,
    events: EventEmitter<AdapterEvent>,
}

/// Standard wallet-adapter interface over the TrashPack injected wallet.
///
/// The adapter is cheap to clone, clones share the same session.
///
/// It is built for the single threaded browser event loop: every operation
/// is `async` and only yields while waiting on the wallet.
pub struct WalletAdapter<P: Platform> {
    inner: Rc<Inner<P>>,
}

impl<P: Platform> Clone for WalletAdapter<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Owns the `connecting` flag for the duration of a connection attempt.
struct Connecting<'a>(&'a Cell<bool>);

impl<'a> Connecting<'a> {
    fn start(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for Connecting<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl<P: Platform + 'static> WalletAdapter<P> {
    pub fn new(platform: P) -> Self {
        Self::with_config(platform, AdapterConfig::default())
    }

    pub fn with_config(platform: P, config: AdapterConfig) -> Self {
        let ready_state = if !platform.is_supported() {
            ReadyState::Unsupported
        } else if platform.is_ios_redirectable() {
            ReadyState::Loadable
        } else {
            ReadyState::NotDetected
        };

        debug!(?config, %ready_state, "TrashPack wallet adapter created");

        Self {
            inner: Rc::new(Inner {
                platform,
                config,
                ready_state: Cell::new(ready_state),
                connecting: Cell::new(false),
                session: RefCell::new(None),
                events: EventEmitter::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        WALLET_NAME
    }

    pub fn url(&self) -> &'static str {
        WALLET_URL
    }

    /// data URI of the wallet's icon, ready to use as an `img` source
    pub fn icon(&self) -> &'static str {
        WALLET_ICON
    }

    pub fn supported_transaction_versions(&self) -> &'static [TransactionVersion] {
        &SUPPORTED_TRANSACTION_VERSIONS
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.inner.config
    }

    pub fn platform(&self) -> &P {
        &self.inner.platform
    }

    pub fn ready_state(&self) -> ReadyState {
        self.inner.ready_state.get()
    }

    pub fn connecting(&self) -> bool {
        self.inner.connecting.get()
    }

    pub fn connected(&self) -> bool {
        self.inner.session.borrow().is_some()
    }

    pub fn public_key(&self) -> Option<PublicKey> {
        self.inner
            .session
            .borrow()
            .as_ref()
            .map(|session| session.public_key)
    }

    pub fn on(
        &self,
        kind: AdapterEventKind,
        listener: impl Fn(&AdapterEvent) + 'static,
    ) -> ListenerId {
        self.inner.events.on(kind, Rc::new(listener))
    }

    pub fn off(&self, kind: AdapterEventKind, id: ListenerId) -> bool {
        self.inner.events.off(kind, id)
    }

    /// Poll for the injected wallet until it shows up or the configured
    /// number of attempts is exhausted.
    ///
    /// Only does something while the wallet is [`ReadyState::NotDetected`].
    /// Returns the ready state once done.
    pub async fn detect(&self) -> ReadyState {
        if self.ready_state() != ReadyState::NotDetected {
            return self.ready_state();
        }

        let interval = self.inner.config.detection_interval();
        let mut attempts = 0u32;

        loop {
            if self
                .inner
                .platform
                .wallet()
                .is_some_and(|wallet| wallet.is_trashpack())
            {
                info!(attempts, "TrashPack wallet detected");
                self.inner.ready_state.set(ReadyState::Installed);
                self.inner
                    .emit(AdapterEvent::ReadyStateChange(ReadyState::Installed));
                return ReadyState::Installed;
            }

            attempts += 1;
            if self
                .inner
                .config
                .max_detection_attempts
                .is_some_and(|max| attempts >= max)
            {
                debug!(attempts, "TrashPack wallet not detected, giving up");
                return ReadyState::NotDetected;
            }

            self.inner.platform.sleep(interval).await;

            // the adapter may have been settled by another detection loop
            if self.ready_state() != ReadyState::NotDetected {
                return self.ready_state();
            }
        }
    }

    /// connect only if the wallet is installed, typically on page load
    pub async fn auto_connect(&self) -> Result<(), WalletError> {
        if self.ready_state() == ReadyState::Installed {
            self.connect().await
        } else {
            Ok(())
        }
    }

    pub async fn connect(&self) -> Result<(), WalletError> {
        let result = self.try_connect().await;
        if let Err(error) = &result {
            self.inner.emit(AdapterEvent::Error(error.clone()));
        }
        result
    }

    async fn try_connect(&self) -> Result<(), WalletError> {
        if self.connected() || self.connecting() {
            return Ok(());
        }

        match self.ready_state() {
            ReadyState::Loadable => {
                let location = self.inner.platform.location();
                let url = connect_redirect_url(&self.inner.config.connect_url, &location);
                info!(%url, "redirecting to the TrashPack connect page");
                self.inner.platform.redirect(&url);
                return Ok(());
            }
            ReadyState::Installed => (),
            ReadyState::Unsupported | ReadyState::NotDetected => {
                return Err(WalletErrorKind::NotReady.into());
            }
        }

        let _connecting = Connecting::start(&self.inner.connecting);

        let wallet = self
            .inner
            .platform
            .wallet()
            .filter(|wallet| wallet.is_trashpack())
            .ok_or(WalletError::new(WalletErrorKind::NotReady))?;

        if !wallet.is_connected() {
            let identity = wallet
                .connect()
                .await
                .map_err(|error| WalletError::with_cause(WalletErrorKind::ConnectionFailed, error))?;
            if identity.is_none() {
                return Err(WalletErrorKind::AccountUnavailable.into());
            }
        }

        let identity = wallet
            .public_key()
            .ok_or(WalletError::new(WalletErrorKind::AccountUnavailable))?;
        let public_key = PublicKey::try_from(&identity)
            .map_err(|error| WalletError::with_cause(WalletErrorKind::PublicKeyMalformed, error))?;

        let on_disconnect = wallet.on(
            ProviderEventKind::Disconnect,
            Inner::listener(&self.inner, |inner, _| inner.disconnected()),
        );
        let on_account_changed = wallet.on(
            ProviderEventKind::AccountChanged,
            Inner::listener(&self.inner, |inner, event| {
                if let ProviderEvent::AccountChanged(identity) = event {
                    inner.account_changed(identity.as_ref());
                }
            }),
        );

        *self.inner.session.borrow_mut() = Some(Session {
            wallet,
            public_key,
            on_disconnect,
            on_account_changed,
        });

        info!(%public_key, "TrashPack wallet connected");
        self.inner.emit(AdapterEvent::Connect(public_key));
        Ok(())
    }

    /// Release the session. Never fails: a failure of the wallet is only
    /// reported through an [`AdapterEventKind::Error`] event.
    pub async fn disconnect(&self) {
        let session = self.inner.session.borrow_mut().take();

        if let Some(session) = session {
            session.unsubscribe();
            debug!(public_key = %session.public_key, "disconnecting the TrashPack wallet");

            if let Err(error) = session.wallet.disconnect().await {
                warn!(%error, "the TrashPack wallet failed to disconnect");
                self.inner.emit(AdapterEvent::Error(WalletError::with_cause(
                    WalletErrorKind::DisconnectionFailed,
                    error,
                )));
            }
        }

        self.inner.emit(AdapterEvent::Disconnect);
    }

    /// Fill in the fee payer (with the connected account) and the recent
    /// blockhash if the transaction does not set them already.
    pub async fn prepare_transaction<C: Connection>(
        &self,
        mut transaction: LegacyTransaction,
        connection: &C,
        options: &SendOptions,
    ) -> Result<LegacyTransaction, ConnectionError> {
        if transaction.fee_payer.is_none() {
            transaction.fee_payer = self.public_key();
        }

        if transaction.recent_blockhash.is_none() {
            let blockhash = connection
                .latest_blockhash(BlockhashConfig {
                    commitment: options.preflight_commitment,
                    min_context_slot: options.min_context_slot,
                })
                .await?;
            transaction.recent_blockhash = Some(blockhash);
        }

        Ok(transaction)
    }

    pub async fn send_transaction<C: Connection>(
        &self,
        transaction: Transaction,
        connection: &C,
        options: SendTransactionOptions<'_>,
    ) -> Result<Signature, WalletError> {
        let result = self.try_send_transaction(transaction, connection, options).await;
        self.inner.report(result)
    }

    async fn try_send_transaction<C: Connection>(
        &self,
        transaction: Transaction,
        connection: &C,
        options: SendTransactionOptions<'_>,
    ) -> Result<Signature, WalletError> {
        let wallet = self.inner.wallet()?;
        let failed =
            |cause: ErrorCause| WalletError::with_cause(WalletErrorKind::SendTransactionFailed, cause);

        let SendTransactionOptions {
            signers,
            mut send_options,
        } = options;

        let transaction = match transaction {
            Transaction::Versioned(mut transaction) => {
                if !signers.is_empty() {
                    transaction.sign(&signers).map_err(|e| failed(e.into()))?;
                }
                Transaction::Versioned(transaction)
            }
            Transaction::Legacy(transaction) => {
                let mut transaction = self
                    .prepare_transaction(transaction, connection, &send_options)
                    .await
                    .map_err(|e| failed(e.into()))?;
                if !signers.is_empty() {
                    transaction
                        .partial_sign(&signers)
                        .map_err(|e| failed(e.into()))?;
                }
                Transaction::Legacy(transaction)
            }
        };

        if send_options.preflight_commitment.is_none() {
            send_options.preflight_commitment = connection.commitment();
        }

        let signature = wallet
            .sign_and_send_transaction(&transaction, &send_options)
            .await
            .map_err(|e| failed(e.into()))?;

        debug!(%signature, "transaction sent through the TrashPack wallet");
        Ok(signature)
    }

    pub async fn sign_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Transaction, WalletError> {
        let result: Result<Transaction, WalletError> = async {
            let wallet = self.inner.wallet()?;
            let signed = wallet.sign_transaction(&transaction).await.map_err(|error| {
                WalletError::with_cause(WalletErrorKind::SignTransactionFailed, error)
            })?;
            Ok(signed.unwrap_or(transaction))
        }
        .await;

        self.inner.report(result)
    }

    pub async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, WalletError> {
        let result: Result<Vec<Transaction>, WalletError> = async {
            let wallet = self.inner.wallet()?;
            let signed = wallet
                .sign_all_transactions(&transactions)
                .await
                .map_err(|error| {
                    WalletError::with_cause(WalletErrorKind::SignTransactionFailed, error)
                })?;
            Ok(signed.unwrap_or(transactions))
        }
        .await;

        self.inner.report(result)
    }

    pub async fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError> {
        let result: Result<Signature, WalletError> = async {
            let wallet = self.inner.wallet()?;
            wallet.sign_message(message).await.map_err(|error| {
                WalletError::with_cause(WalletErrorKind::SignMessageFailed, error)
            })
        }
        .await;

        self.inner.report(result)
    }
}

impl<P: Platform + 'static> Inner<P> {
    fn emit(&self, event: AdapterEvent) {
        self.events.emit(&event);
    }

    fn report<T>(&self, result: Result<T, WalletError>) -> Result<T, WalletError> {
        if let Err(error) = &result {
            self.emit(AdapterEvent::Error(error.clone()));
        }
        result
    }

    fn wallet(&self) -> Result<P::Wallet, WalletError> {
        self.session
            .borrow()
            .as_ref()
            .map(|session| session.wallet.clone())
            .ok_or(WalletError::new(WalletErrorKind::NotConnected))
    }

    /// wrap a handler so the wallet does not keep the adapter alive
    fn listener(
        this: &Rc<Self>,
        handler: impl Fn(&Self, &ProviderEvent) + 'static,
    ) -> Listener<ProviderEvent> {
        let this: Weak<Self> = Rc::downgrade(this);
        Rc::new(move |event: &ProviderEvent| {
            if let Some(inner) = this.upgrade() {
                handler(inner.as_ref(), event);
            }
        })
    }

    /// the wallet dropped the session on its own
    fn disconnected(&self) {
        let session = self.session.borrow_mut().take();
        let Some(session) = session else {
            return;
        };

        session.unsubscribe();
        warn!(public_key = %session.public_key, "TrashPack wallet disconnected unexpectedly");

        self.emit(AdapterEvent::Error(WalletError::new(
            WalletErrorKind::UnexpectedDisconnect,
        )));
        self.emit(AdapterEvent::Disconnect);
    }

    fn account_changed(&self, identity: Option<&WalletIdentity>) {
        let Some(current) = self.session.borrow().as_ref().map(|s| s.public_key) else {
            return;
        };

        let public_key = match identity {
            Some(identity) => PublicKey::try_from(identity)
                .map_err(|error| WalletError::with_cause(WalletErrorKind::PublicKeyMalformed, error)),
            None => Err(WalletError::new(WalletErrorKind::PublicKeyMalformed)),
        };
        let public_key = match public_key {
            Ok(public_key) => public_key,
            Err(error) => {
                warn!(%error, "TrashPack wallet changed to an unreadable account");
                self.emit(AdapterEvent::Error(error));
                return;
            }
        };

        if public_key == current {
            return;
        }

        if let Some(session) = self.session.borrow_mut().as_mut() {
            session.public_key = public_key;
        }

        info!(%public_key, "TrashPack wallet account changed");
        self.emit(AdapterEvent::Connect(public_key));
    }
}
