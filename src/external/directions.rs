use serde::{Deserialize, Serialize};

use crate::{
    config::DirectionsConfig,
    entities::RouteInfo,
    error::Error,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response {
    status: String,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Route {
    legs: Vec<Leg>,
    overview_polyline: Option<Polyline>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Leg {
    distance: Measure,
    duration: Measure,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Measure {
    value: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Polyline {
    points: String,
}

/// Client for the maps provider's directions endpoint.
#[derive(Clone, Debug)]
pub struct Directions {
    config: DirectionsConfig,
    client: reqwest::Client,
}

impl Directions {
    pub fn new(config: DirectionsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_route(&self, origin: &str, destination: &str) -> Result<RouteInfo, Error> {
        let url = format!(
            "https://{}/maps/api/directions/json",
            self.config.api_base
        );

        let res = self
            .client
            .get(url)
            .query(&[("key", self.config.api_key.as_str())])
            .query(&[("origin", origin)])
            .query(&[("destination", destination)])
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code >= 400 && status_code < 500 {
            return Err(Error::validation_error("route lookup was rejected"));
        } else if status_code != 200 {
            return Err(Error::upstream_error());
        }

        let data: Response = res.json().await?;

        route_info(data)
    }
}

fn route_info(data: Response) -> Result<RouteInfo, Error> {
    if data.status == "ZERO_RESULTS" || data.status == "NOT_FOUND" {
        return Err(Error::validation_error("no route between these places"));
    }

    if data.status != "OK" {
        return Err(Error::upstream_error());
    }

    let route = data
        .routes
        .into_iter()
        .next()
        .ok_or_else(Error::upstream_error)?;

    if route.legs.is_empty() {
        return Err(Error::upstream_error());
    }

    let meters: f64 = route.legs.iter().map(|l| l.distance.value).sum();
    let seconds: f64 = route.legs.iter().map(|l| l.duration.value).sum();

    Ok(RouteInfo {
        distance_km: meters / 1000.0,
        duration_minutes: Some(seconds / 60.0),
        polyline: route.overview_polyline.map(|p| p.points),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legs_are_summed_into_route_info() {
        let data: Response = serde_json::from_value(json!({
            "status": "OK",
            "routes": [{
                "legs": [
                    { "distance": { "value": 300000.0 }, "duration": { "value": 12600.0 } },
                    { "distance": { "value": 163000.0 }, "duration": { "value": 7200.0 } }
                ],
                "overview_polyline": { "points": "a~l~Fjk~uOwHJy@P" }
            }]
        }))
        .unwrap();

        let route = route_info(data).unwrap();

        assert_eq!(route.distance_km, 463.0);
        assert_eq!(route.duration_minutes, Some(330.0));
        assert_eq!(route.polyline.as_deref(), Some("a~l~Fjk~uOwHJy@P"));
    }

    #[test]
    fn provider_statuses() {
        let data: Response = serde_json::from_value(json!({ "status": "ZERO_RESULTS" })).unwrap();
        assert!(route_info(data).unwrap_err().is_validation_error());

        let data: Response =
            serde_json::from_value(json!({ "status": "OVER_QUERY_LIMIT" })).unwrap();
        assert!(route_info(data).unwrap_err().is_internal_error());

        let data: Response = serde_json::from_value(json!({ "status": "OK", "routes": [] })).unwrap();
        assert!(route_info(data).unwrap_err().is_internal_error());
    }
}
