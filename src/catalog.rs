//! The lab's test catalog, quick search and static listings

use serde::Serialize;

/// Shown when a search matches nothing
pub const NO_RESULTS_HINT: &str = "No tests found. Try different keyword.";

/// Where the downloadable PDF rate list is served, relative to the site root
pub const RATE_LIST_PATH: &str = "/files/Bagree%20diagnostic%20centre%20Rate%20list_2.pdf";

/// A test the lab offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    /// Price in whole rupees
    pub price: u32,
}

impl Service {
    /// Price as displayed to patients, e.g. `₹650`
    pub fn price_label(&self) -> String {
        format!("₹{}", self.price)
    }

    fn matches(&self, needle: &str) -> bool {
        format!("{} {}", self.name, self.description)
            .to_lowercase()
            .contains(needle)
    }
}

const SAMPLE_SERVICES: [Service; 5] = [
    Service { id: 1, name: "Complete Blood Count (CBC)", description: "Basic blood profile", price: 250 },
    Service { id: 2, name: "Thyroid Profile (T3,T4,TSH)", description: "Thyrocare-style panel", price: 650 },
    Service { id: 3, name: "Lipid Profile", description: "Cholesterol and triglycerides", price: 450 },
    Service { id: 4, name: "COVID-19 RT-PCR", description: "Gold-standard viral test", price: 1200 },
    Service { id: 5, name: "Diabetes (HbA1c)", description: "Long-term glucose marker", price: 600 },
];

/// Immutable list of offered tests
#[derive(Debug, Clone)]
pub struct Catalog {
    services: Vec<Service>,
}

impl Catalog {
    /// Build a catalog from an explicit list
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    /// The lab's published sample of five tests
    pub fn sample() -> Self {
        Self::new(SAMPLE_SERVICES.to_vec())
    }

    /// Every service, in catalog order
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Services whose name and description contain `query`, ignoring case.
    ///
    /// Catalog order is kept and an empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<&Service> {
        let needle = query.to_lowercase();
        self.services.iter().filter(|s| s.matches(&needle)).collect()
    }

    pub fn find(&self, id: u32) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::sample()
    }
}

/// Absolute URL of the rate-list PDF
pub fn rate_list_url(site_url: &str) -> String {
    format!("{}{}", site_url.trim_end_matches('/'), RATE_LIST_PATH)
}

/// How to reach the lab
#[derive(Debug, Clone, Serialize)]
pub struct ContactCard {
    pub name: &'static str,
    pub tagline: &'static str,
    pub address: &'static [&'static str],
    pub phone: &'static str,
    pub email: &'static str,
}

pub const CONTACT: ContactCard = ContactCard {
    name: "Bagree Diagnostic Centre",
    tagline: "Trusted pathology & diagnostic services",
    address: &["Opp. XYZ, Main Road", "City, State - PIN"],
    phone: "+91 12345 67890",
    email: "info@bagreedx.com",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thyroid_query_finds_one_entry() {
        let catalog = Catalog::sample();
        let hits = catalog.search("thyroid");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Thyroid Profile (T3,T4,TSH)");
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let catalog = Catalog::sample();
        let ids: Vec<u32> = catalog.search("").iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn search_matches_description_and_ignores_case() {
        let catalog = Catalog::sample();
        let ids: Vec<u32> = catalog.search("GLUCOSE").iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![5]);

        // "profile" appears in names of 2 and 3 and the description of 1
        let ids: Vec<u32> = catalog.search("Profile").iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert!(catalog.search("mri").is_empty());
    }

    #[test]
    fn search_agrees_with_substring_definition() {
        let catalog = Catalog::sample();
        for query in ["", "a", "PCR", " ", "t3,t4", "blood profile", "zzz", "(hba1c)"] {
            let expected: Vec<u32> = catalog
                .services()
                .iter()
                .filter(|s| {
                    format!("{} {}", s.name, s.description)
                        .to_lowercase()
                        .contains(&query.to_lowercase())
                })
                .map(|s| s.id)
                .collect();
            let actual: Vec<u32> = catalog.search(query).iter().map(|s| s.id).collect();
            assert_eq!(actual, expected, "query {:?}", query);
        }
    }

    #[test]
    fn prices_and_lookups() {
        let catalog = Catalog::sample();
        assert_eq!(catalog.find(4).map(|s| s.price_label()), Some("₹1200".to_string()));
        assert_eq!(catalog.find_by_name("Lipid Profile").map(|s| s.id), Some(3));
        assert!(catalog.find(42).is_none());
    }

    #[test]
    fn rate_list_is_under_the_site_root() {
        assert_eq!(
            rate_list_url("https://bagreedx.com/"),
            "https://bagreedx.com/files/Bagree%20diagnostic%20centre%20Rate%20list_2.pdf"
        );
    }
}
