//! Geospatial commands
//!
//! Geo replies need to know the unit and the requested fields to be decoded,
//! so the distance and search commands carry that state in dedicated
//! [`Command`] types instead of a plain [`Request`].

use super::{invalid, Command, CommandExecutor, Request};
use crate::convert::args::CommandArgs;
use crate::convert::reply;
use bytes::Bytes;
use redis_connector_core::error::RedisResult;
use redis_connector_core::types::{
    Distance, GeoRadiusArgs, GeoReference, GeoResults, GeoSearchStoreArgs, GeoShape, Metric,
    Point,
};
use redis_connector_core::value::RespValue;

/// `GEODIST key member1 member2 unit`
#[derive(Debug, Clone)]
pub struct GeoDistCommand {
    key: Bytes,
    from: Bytes,
    to: Bytes,
    metric: Metric,
}

impl GeoDistCommand {
    /// Distance between two members, reported in `metric`
    pub fn new(
        key: impl AsRef<[u8]>,
        from: impl AsRef<[u8]>,
        to: impl AsRef<[u8]>,
        metric: Metric,
    ) -> Self {
        Self {
            key: Bytes::copy_from_slice(key.as_ref()),
            from: Bytes::copy_from_slice(from.as_ref()),
            to: Bytes::copy_from_slice(to.as_ref()),
            metric,
        }
    }
}

impl Command for GeoDistCommand {
    type Output = Option<Distance>;

    fn command_name(&self) -> &str {
        "GEODIST"
    }

    fn args(&self) -> Vec<Bytes> {
        vec![
            self.key.clone(),
            self.from.clone(),
            self.to.clone(),
            Bytes::from_static(self.metric.abbreviation().as_bytes()),
        ]
    }

    fn parse_response(&self, response: RespValue) -> RedisResult<Self::Output> {
        reply::distance(response, self.metric)
    }

    fn keys(&self) -> Vec<&[u8]> {
        vec![&self.key[..]]
    }
}

/// `GEORADIUS`, `GEORADIUSBYMEMBER` and `GEOSEARCH`
#[derive(Debug, Clone)]
pub struct GeoRadiusCommand {
    name: &'static str,
    key: Bytes,
    args: Vec<Bytes>,
    with_dist: bool,
    with_coord: bool,
    metric: Metric,
}

impl GeoRadiusCommand {
    /// `GEORADIUS key longitude latitude radius unit ...`
    pub fn around_point(
        key: impl AsRef<[u8]>,
        center: Point,
        radius: Distance,
        args: &GeoRadiusArgs,
    ) -> Self {
        let mut tokens = vec![
            Bytes::from(center.longitude.to_string()),
            Bytes::from(center.latitude.to_string()),
        ];
        push_radius(&mut tokens, radius);
        args.write_args(&mut tokens);
        Self::build("GEORADIUS", key, tokens, args, radius.metric)
    }

    /// `GEORADIUSBYMEMBER key member radius unit ...`
    pub fn around_member(
        key: impl AsRef<[u8]>,
        member: impl AsRef<[u8]>,
        radius: Distance,
        args: &GeoRadiusArgs,
    ) -> Self {
        let mut tokens = vec![Bytes::copy_from_slice(member.as_ref())];
        push_radius(&mut tokens, radius);
        args.write_args(&mut tokens);
        Self::build("GEORADIUSBYMEMBER", key, tokens, args, radius.metric)
    }

    /// `GEOSEARCH key FROMMEMBER|FROMLONLAT ... BYRADIUS|BYBOX ... ...`
    pub fn search<T: AsRef<[u8]>>(
        key: impl AsRef<[u8]>,
        reference: &GeoReference<T>,
        shape: &GeoShape,
        args: &GeoRadiusArgs,
    ) -> Self {
        let mut tokens = Vec::new();
        reference.write_args(&mut tokens);
        shape.write_args(&mut tokens);
        args.write_args(&mut tokens);
        Self::build("GEOSEARCH", key, tokens, args, shape.metric())
    }

    fn build(
        name: &'static str,
        key: impl AsRef<[u8]>,
        args: Vec<Bytes>,
        options: &GeoRadiusArgs,
        metric: Metric,
    ) -> Self {
        Self {
            name,
            key: Bytes::copy_from_slice(key.as_ref()),
            args,
            with_dist: options.with_dist,
            with_coord: options.with_coord,
            metric,
        }
    }
}

fn push_radius(tokens: &mut Vec<Bytes>, radius: Distance) {
    tokens.push(Bytes::from(radius.value.to_string()));
    tokens.push(Bytes::from_static(radius.metric.abbreviation().as_bytes()));
}

impl Command for GeoRadiusCommand {
    type Output = GeoResults<Bytes>;

    fn command_name(&self) -> &str {
        self.name
    }

    fn args(&self) -> Vec<Bytes> {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.key.clone());
        args.extend(self.args.iter().cloned());
        args
    }

    fn parse_response(&self, response: RespValue) -> RedisResult<Self::Output> {
        reply::geo_results(response, self.with_dist, self.with_coord, self.metric)
    }

    fn keys(&self) -> Vec<&[u8]> {
        vec![&self.key[..]]
    }
}

/// Commands on geospatial indexes
pub trait GeoCommands: CommandExecutor {
    /// `GEOADD key longitude latitude member`
    fn geo_add<K: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        key: K,
        point: Point,
        member: M,
    ) -> Self::Reply<'_, i64> {
        self.execute(
            Request::new("GEOADD", reply::integer)
                .key(key)
                .num(point.longitude)
                .num(point.latitude)
                .arg(member),
        )
    }

    /// `GEOADD key longitude latitude member [...]`
    fn geo_add_many<K: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        key: K,
        locations: &[(Point, M)],
    ) -> Self::Reply<'_, i64> {
        if locations.is_empty() {
            return self.reject(invalid("GEOADD needs at least one location"));
        }
        let mut request = Request::new("GEOADD", reply::integer).key(key);
        for (point, member) in locations {
            request = request
                .num(point.longitude)
                .num(point.latitude)
                .arg(member);
        }
        self.execute(request)
    }

    /// `GEODIST key member1 member2 unit`; `None` when a member is missing
    fn geo_dist<K: AsRef<[u8]>, A: AsRef<[u8]>, B: AsRef<[u8]>>(
        &mut self,
        key: K,
        from: A,
        to: B,
        metric: Metric,
    ) -> Self::Reply<'_, Option<Distance>> {
        self.execute(GeoDistCommand::new(key, from, to, metric))
    }

    /// `GEOHASH key member [member ...]`
    fn geo_hash<K: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        key: K,
        members: &[M],
    ) -> Self::Reply<'_, Vec<Option<String>>> {
        self.execute(Request::new("GEOHASH", reply::geohashes).key(key).multi_arg(members))
    }

    /// `GEOPOS key member [member ...]`
    fn geo_pos<K: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        key: K,
        members: &[M],
    ) -> Self::Reply<'_, Vec<Option<Point>>> {
        self.execute(Request::new("GEOPOS", reply::positions).key(key).multi_arg(members))
    }

    /// Members within `radius` of a point
    fn geo_radius<K: AsRef<[u8]>>(
        &mut self,
        key: K,
        center: Point,
        radius: Distance,
        args: &GeoRadiusArgs,
    ) -> Self::Reply<'_, GeoResults<Bytes>> {
        self.execute(GeoRadiusCommand::around_point(key, center, radius, args))
    }

    /// Members within `radius` of another member
    fn geo_radius_by_member<K: AsRef<[u8]>, M: AsRef<[u8]>>(
        &mut self,
        key: K,
        member: M,
        radius: Distance,
        args: &GeoRadiusArgs,
    ) -> Self::Reply<'_, GeoResults<Bytes>> {
        self.execute(GeoRadiusCommand::around_member(key, member, radius, args))
    }

    /// `GEOSEARCH`
    fn geo_search<K: AsRef<[u8]>, T: AsRef<[u8]>>(
        &mut self,
        key: K,
        reference: &GeoReference<T>,
        shape: &GeoShape,
        args: &GeoRadiusArgs,
    ) -> Self::Reply<'_, GeoResults<Bytes>> {
        self.execute(GeoRadiusCommand::search(key, reference, shape, args))
    }

    /// `GEOSEARCHSTORE destination source ...`, number of stored members
    fn geo_search_store<D: AsRef<[u8]>, K: AsRef<[u8]>, T: AsRef<[u8]>>(
        &mut self,
        destination: D,
        key: K,
        reference: &GeoReference<T>,
        shape: &GeoShape,
        args: &GeoSearchStoreArgs,
    ) -> Self::Reply<'_, i64> {
        self.execute(
            Request::new("GEOSEARCHSTORE", reply::integer)
                .key(destination)
                .key(key)
                .with(reference)
                .with(shape)
                .with(args),
        )
    }

    /// Remove members; geo indexes are sorted sets, so this is `ZREM`
    fn geo_remove<K: AsRef<[u8]>, M: AsRef<[u8]>>(&mut self, key: K, members: &[M]) -> Self::Reply<'_, i64> {
        if members.is_empty() {
            return self.reject(invalid("GEO remove needs at least one member"));
        }
        self.execute(Request::new("ZREM", reply::integer).key(key).multi_arg(members))
    }
}

impl<T: CommandExecutor> GeoCommands for T {}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(command: &impl Command) -> Vec<String> {
        command
            .args()
            .iter()
            .map(|a| String::from_utf8_lossy(a).into_owned())
            .collect()
    }

    #[test]
    fn test_georadius_layout() {
        let args = GeoRadiusArgs::new().include_distance().limit(5).sort_ascending();
        let command =
            GeoRadiusCommand::around_point("Sicily", Point::new(15.0, 37.0), Distance::kilometers(200.0), &args);
        assert_eq!(command.command_name(), "GEORADIUS");
        assert_eq!(
            words(&command),
            vec!["Sicily", "15", "37", "200", "km", "WITHDIST", "COUNT", "5", "ASC"]
        );
    }

    #[test]
    fn test_geosearch_decodes_distance_in_shape_unit() {
        let args = GeoRadiusArgs::new().include_distance();
        let command = GeoRadiusCommand::search(
            "Sicily",
            &GeoReference::Member("Palermo"),
            &GeoShape::Radius(Distance::kilometers(200.0)),
            &args,
        );
        let reply = RespValue::Array(vec![RespValue::Array(vec![
            RespValue::BulkString(Bytes::from_static(b"Catania")),
            RespValue::BulkString(Bytes::from_static(b"166.2742")),
        ])]);
        let results = command.parse_response(reply).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results.results[0].distance, Distance::kilometers(166.2742));
        assert_eq!(results.results[0].content.point, None);
    }

    #[test]
    fn test_geodist_sends_unit() {
        let command = GeoDistCommand::new("Sicily", "Palermo", "Catania", Metric::Miles);
        assert_eq!(words(&command), vec!["Sicily", "Palermo", "Catania", "mi"]);
        assert_eq!(command.parse_response(RespValue::Null).unwrap(), None);
    }
}
