// src/site.rs
//
// Shopping-site gate. Everything downstream is skipped when the page address
// does not look like a storefront.

use log::debug;
use url::Url;

use crate::settings::SiteRules;

/// Decide whether an address belongs to a shopping site.
///
/// Hostname is matched by substring containment against the configured domain
/// allow-list; a subdomain, or a domain that merely contains a listed string,
/// also matches. When no domain matches, hostname or path containment of any
/// configured keyword decides. A malformed address is simply not a shopping
/// site — this never fails.
pub fn is_shopping_site(address: &str, rules: &SiteRules) -> bool {
    let Ok(url) = Url::parse(address) else {
        debug!("unparseable address '{}', not a shopping site", address);
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let path = url.path().to_ascii_lowercase();

    if rules
        .shopping_domains
        .iter()
        .any(|d| host.contains(&d.to_ascii_lowercase()))
    {
        return true;
    }

    rules.url_keywords.iter().any(|k| {
        let k = k.to_ascii_lowercase();
        host.contains(&k) || path.contains(&k)
    })
}
