use crate::{
    error::ProviderError,
    event::{Event, Listener, ListenerId},
    solana::{SendOptions, Signature, Transaction, WalletIdentity},
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::time::Duration;
use url::Url;

/// what `encodeURIComponent` escapes
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Notification sent by the injected wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Disconnect,
    /// the user switched to another account, `None` if the wallet did not
    /// say which one
    AccountChanged(Option<WalletIdentity>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderEventKind {
    Disconnect,
    AccountChanged,
}

impl ProviderEventKind {
    /// name of the event on the injected wallet object
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnect => "disconnect",
            Self::AccountChanged => "accountChanged",
        }
    }
}

impl Event for ProviderEvent {
    type Kind = ProviderEventKind;

    fn kind(&self) -> ProviderEventKind {
        match self {
            Self::Disconnect => ProviderEventKind::Disconnect,
            Self::AccountChanged(_) => ProviderEventKind::AccountChanged,
        }
    }
}

/// The primitives of the wallet object injected in the page by the
/// extension.
///
/// Signing methods may resolve to `None`, the adapter then hands the input
/// back to the caller.
#[allow(async_fn_in_trait)]
pub trait WalletProvider: Clone {
    /// the `isTrashPack` marker flag
    fn is_trashpack(&self) -> bool;

    /// whether the page is already connected at the wallet level
    fn is_connected(&self) -> bool;

    fn public_key(&self) -> Option<WalletIdentity>;

    /// prompt the user to connect, resolves to the identity of the approved
    /// account
    async fn connect(&self) -> Result<Option<WalletIdentity>, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;

    async fn sign_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Option<Transaction>, ProviderError>;

    async fn sign_all_transactions(
        &self,
        transactions: &[Transaction],
    ) -> Result<Option<Vec<Transaction>>, ProviderError>;

    async fn sign_and_send_transaction(
        &self,
        transaction: &Transaction,
        options: &SendOptions,
    ) -> Result<Signature, ProviderError>;

    /// resolves to the signature of the message by the connected account
    async fn sign_message(&self, message: &[u8]) -> Result<Signature, ProviderError>;

    fn on(&self, kind: ProviderEventKind, listener: Listener<ProviderEvent>) -> ListenerId;

    fn off(&self, kind: ProviderEventKind, id: ListenerId) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub href: String,
    pub origin: String,
}

/// What the adapter needs from the environment it runs in.
#[allow(async_fn_in_trait)]
pub trait Platform {
    type Wallet: WalletProvider;

    /// `false` when there is no page to inject a wallet in (e.g. server side
    /// rendering)
    fn is_supported(&self) -> bool;

    /// `true` when the wallet can only be reached by redirecting to its own
    /// page (mobile Safari)
    fn is_ios_redirectable(&self) -> bool;

    /// the injected wallet, if any
    fn wallet(&self) -> Option<Self::Wallet>;

    fn location(&self) -> Location;

    fn redirect(&self, url: &Url);

    async fn sleep(&self, duration: Duration);
}

/// detect iOS Safari from the navigator's user agent
pub fn is_ios_redirectable(user_agent: &str) -> bool {
    let user_agent = user_agent.to_lowercase();
    let is_ios = user_agent.contains("iphone") || user_agent.contains("ipad");
    let is_safari = user_agent.contains("safari");

    is_ios && is_safari
}

/// build the URL that hands the connection over to the wallet's own page,
/// carrying where to come back to
pub fn connect_redirect_url(connect_url: &Url, location: &Location) -> Url {
    let query = format!(
        "url={}&ref={}",
        utf8_percent_encode(&location.href, URI_COMPONENT),
        utf8_percent_encode(&location.origin, URI_COMPONENT),
    );

    let mut url = connect_url.clone();
    url.set_query(Some(&query));
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ios_detection() {
        assert!(is_ios_redirectable(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1"
        ));
        assert!(is_ios_redirectable(
            "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Mobile/15E148 Safari/604.1"
        ));
        assert!(!is_ios_redirectable(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15"
        ));
        // in-app browsers don't advertise safari
        assert!(!is_ios_redirectable(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148"
        ));
    }

    #[test]
    fn redirect_url() {
        let connect_url = Url::parse("https://trashpack.tech/connect").unwrap();
        let location = Location {
            href: "https://dapp.example/swap?from=SOL".to_owned(),
            origin: "https://dapp.example".to_owned(),
        };

        let url = connect_redirect_url(&connect_url, &location);

        assert_eq!(
            url.as_str(),
            "https://trashpack.tech/connect?url=https%3A%2F%2Fdapp.example%2Fswap%3Ffrom%3DSOL&ref=https%3A%2F%2Fdapp.example"
        );

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("url".to_owned(), location.href.clone()),
                ("ref".to_owned(), location.origin.clone()),
            ]
        );
    }

    #[test]
    fn redirect_url_escapes_like_uri_components() {
        let connect_url = Url::parse("https://trashpack.tech/connect?stale=1").unwrap();
        let location = Location {
            href: "https://dapp.example/a b?x=1&q=!'()*~".to_owned(),
            origin: "https://dapp.example".to_owned(),
        };

        let url = connect_redirect_url(&connect_url, &location);

        // `'` is escaped by the URL parser in the query of https URLs, as a
        // browser does when assigning `location.href`
        assert_eq!(
            url.as_str(),
            "https://trashpack.tech/connect?url=https%3A%2F%2Fdapp.example%2Fa%20b%3Fx%3D1%26q%3D!%27()*~&ref=https%3A%2F%2Fdapp.example"
        );

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("url".to_owned(), location.href.clone()),
                ("ref".to_owned(), location.origin.clone()),
            ]
        );
    }
}
