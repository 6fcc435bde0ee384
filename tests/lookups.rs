use dnsclient::{Client, Context, Resolver};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::time::Duration;
use tokio::net::UdpSocket;
use trust_dns_proto::op::{Header, ResponseCode};
use trust_dns_proto::rr::rdata::{CAA, MX, SOA, TXT};
use trust_dns_proto::rr::{Name, RData, Record, RecordType};
use trust_dns_server::authority::MessageResponseBuilder;
use trust_dns_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use trust_dns_server::ServerFuture;

const LOCAL_V4: Ipv4Addr = Ipv4Addr::LOCALHOST;
const LOCAL_V6: Ipv6Addr = Ipv6Addr::LOCALHOST;
const PUBLIC_V4: Ipv4Addr = Ipv4Addr::new(93, 184, 216, 34);
const PUBLIC_V6: Ipv6Addr = Ipv6Addr::new(0x2606, 0x2800, 0x220, 0x1, 0x248, 0x1893, 0x25c8, 0x1946);

fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

fn soa() -> RData {
    RData::SOA(SOA::new(
        name("ns.example.com."),
        name("master.example.com."),
        1,
        1,
        1,
        1,
        1,
    ))
}

fn caa_issue() -> RData {
    RData::CAA(CAA::new_issue(false, Some(name("ca.example.net")), vec![]))
}

/// What the zone answers: response code, answer section, authority section.
type Answer = (ResponseCode, Vec<(Name, RData)>, Vec<(Name, RData)>);

fn zone(qname: &str, qtype: RecordType) -> Answer {
    let owner = name(qname);
    let answer = |rdata: RData| (owner.clone(), rdata);
    let ok = |answers: Vec<(Name, RData)>| (ResponseCode::NoError, answers, vec![]);
    let fail = |rcode: ResponseCode| (rcode, vec![], vec![]);

    if qname == "servfail.example.com." {
        return fail(ResponseCode::ServFail);
    }
    match (qtype, qname) {
        (RecordType::A, "nxdomain.example.com.")
        | (RecordType::AAAA, "nxdomain.example.com.") => fail(ResponseCode::NXDomain),
        (RecordType::A, "v4error.example.com.") => fail(ResponseCode::NotImp),
        (RecordType::A, "dualstackerror.example.com.") => fail(ResponseCode::Refused),
        (RecordType::A, "cps.example.com." | "dualstack.example.com." | "v6error.example.com.") => {
            ok(vec![answer(RData::A(LOCAL_V4))])
        }
        (RecordType::A, "mixed.example.com.") => ok(vec![
            answer(RData::A(Ipv4Addr::new(10, 0, 0, 1))),
            answer(RData::A(PUBLIC_V4)),
            answer(RData::A(Ipv4Addr::new(169, 254, 0, 7))),
        ]),
        (RecordType::A, "cname.example.com.") => ok(vec![
            answer(RData::CNAME(name("mixed.example.com."))),
            (name("mixed.example.com."), RData::A(PUBLIC_V4)),
        ]),
        (RecordType::AAAA, "v6error.example.com." | "dualstackerror.example.com.") => {
            fail(ResponseCode::NotImp)
        }
        (RecordType::AAAA, "v6.example.com." | "dualstack.example.com." | "v4error.example.com.") => {
            ok(vec![answer(RData::AAAA(LOCAL_V6))])
        }
        (RecordType::AAAA, "mixed.example.com.") => ok(vec![
            answer(RData::AAAA(Ipv6Addr::from_str("fe80::1").unwrap())),
            answer(RData::AAAA(PUBLIC_V6)),
            answer(RData::AAAA(Ipv6Addr::from_str("fd00::53").unwrap())),
        ]),
        (RecordType::TXT, "split-txt.example.com.") => ok(vec![answer(RData::TXT(TXT::new(
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        )))]),
        (RecordType::TXT, "nxdomain.example.com.") => fail(ResponseCode::NXDomain),
        (RecordType::TXT, _) => (
            ResponseCode::NoError,
            vec![],
            vec![(name("example.com."), soa())],
        ),
        (RecordType::CAA, "caa.example.com.") => ok(vec![answer(caa_issue())]),
        // A CNAME chased to a CAA set, from a resolver that still reports NXDOMAIN.
        (RecordType::CAA, "cname.example.com.") => (
            ResponseCode::NXDomain,
            vec![
                answer(RData::CNAME(name("caa.example.com."))),
                (name("caa.example.com."), caa_issue()),
            ],
            vec![],
        ),
        (RecordType::CAA, "refused.example.com.") => fail(ResponseCode::Refused),
        (RecordType::MX, "email.example.com.") => ok(vec![
            answer(RData::MX(MX::new(10, name("mail.example.com.")))),
            answer(RData::MX(MX::new(20, name("backup-mail.example.com.")))),
        ]),
        (RecordType::MX, "nxdomain.example.com.") => fail(ResponseCode::NXDomain),
        _ => ok(vec![]),
    }
}

fn records(rrs: Vec<(Name, RData)>) -> Vec<Record> {
    rrs.into_iter()
        .map(|(owner, rdata)| Record::from_rdata(owner, 0, rdata))
        .collect()
}

#[derive(Clone)]
struct Zone;

#[async_trait::async_trait]
impl RequestHandler for Zone {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        let query = request.query();
        let qname = query.name().to_string().to_lowercase();
        let (rcode, answers, authorities) = zone(&qname, query.query_type());
        let answers = records(answers);
        let authorities = records(authorities);

        let mut header = Header::response_from_request(request.header());
        header.set_response_code(rcode);
        let builder = MessageResponseBuilder::from_message_request(request);
        let response = builder.build(header, answers.iter(), authorities.iter(), &[], &[]);
        match response_handle.send_response(response).await {
            Ok(info) => info,
            Err(_) => {
                let mut header = Header::new();
                header.set_response_code(ResponseCode::ServFail);
                header.into()
            }
        }
    }
}

async fn serve() -> String {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    let mut server = ServerFuture::new(Zone);
    server.register_socket(socket);
    tokio::spawn(server.block_until_done());
    addr.to_string()
}

async fn test_client() -> Client {
    Client::new(vec![serve().await], Duration::from_secs(10), 1).with_restricted_addresses()
}

fn ctx() -> Context {
    Context::with_timeout(Duration::from_secs(30))
}

#[tokio::test]
async fn one_server() {
    let client = test_client().await;
    assert!(client.lookup_host(&ctx(), "example.com").await.is_ok());
}

#[tokio::test]
async fn duplicate_servers() {
    let server = serve().await;
    let client = Client::new(vec![server.clone(), server], Duration::from_secs(10), 1)
        .with_restricted_addresses();
    assert!(client.lookup_host(&ctx(), "example.com").await.is_ok());
}

#[tokio::test]
async fn server_failure() {
    let client = test_client().await;
    let bad = "servfail.example.com";

    let err = client.lookup_txt(&ctx(), bad).await.unwrap_err();
    assert_eq!(err.rcode(), Some(ResponseCode::ServFail));
    assert_eq!(
        err.to_string(),
        "DNS problem: SERVFAIL looking up TXT for servfail.example.com"
    );

    let err = client.lookup_host(&ctx(), bad).await.unwrap_err();
    assert_eq!(err.record_type(), RecordType::A);
    assert_eq!(err.hostname(), bad);

    let err = client.lookup_caa(&ctx(), bad).await.unwrap_err();
    assert_eq!(err.record_type(), RecordType::CAA);
    assert_eq!(err.rcode(), Some(ResponseCode::ServFail));
    assert!(!err.timeout());
}

#[tokio::test]
async fn lookup_txt() {
    let client = test_client().await;

    let (txts, authorities) = client.lookup_txt(&ctx(), "example.com").await.unwrap();
    assert!(txts.is_empty());
    assert_eq!(authorities.len(), 1);
    assert!(authorities[0].contains("SOA"), "{}", authorities[0]);
    assert!(authorities[0].contains("ns.example.com."), "{}", authorities[0]);

    let (txts, _) = client
        .lookup_txt(&ctx(), "split-txt.example.com")
        .await
        .unwrap();
    assert_eq!(txts, vec!["abc".to_string()]);
}

#[tokio::test]
async fn nxdomain() {
    let client = test_client().await;
    let hostname = "nxdomain.example.com";

    let err = client.lookup_host(&ctx(), hostname).await.unwrap_err();
    assert_eq!(err.record_type(), RecordType::A);
    assert_eq!(err.hostname(), hostname);
    assert_eq!(err.rcode(), Some(ResponseCode::NXDomain));

    let err = client.lookup_txt(&ctx(), hostname).await.unwrap_err();
    assert_eq!(err.record_type(), RecordType::TXT);
    assert_eq!(err.rcode(), Some(ResponseCode::NXDomain));
    assert_eq!(
        err.to_string(),
        "DNS problem: NXDOMAIN looking up TXT for nxdomain.example.com"
    );
}

#[tokio::test]
async fn lookup_host() {
    let client = test_client().await;

    let ips = client
        .lookup_host(&ctx(), "nonexistent.example.com")
        .await
        .unwrap();
    assert!(ips.is_empty(), "not an error to not exist");

    let ips = client.lookup_host(&ctx(), "cps.example.com").await.unwrap();
    assert_eq!(ips, vec![IpAddr::V4(LOCAL_V4)]);

    let ips = client.lookup_host(&ctx(), "v6.example.com").await.unwrap();
    assert_eq!(ips, vec![IpAddr::V6(LOCAL_V6)]);

    let ips = client
        .lookup_host(&ctx(), "dualstack.example.com")
        .await
        .unwrap();
    assert_eq!(ips, vec![IpAddr::V4(LOCAL_V4), IpAddr::V6(LOCAL_V6)]);

    // AAAA fails, A answers
    let ips = client
        .lookup_host(&ctx(), "v6error.example.com")
        .await
        .unwrap();
    assert_eq!(ips, vec![IpAddr::V4(LOCAL_V4)]);

    // A fails, AAAA answers
    let ips = client
        .lookup_host(&ctx(), "v4error.example.com")
        .await
        .unwrap();
    assert_eq!(ips, vec![IpAddr::V6(LOCAL_V6)]);

    // Both fail: the A error (REFUSED) wins over the AAAA error (NOTIMP).
    let hostname = "dualstackerror.example.com";
    let err = client.lookup_host(&ctx(), hostname).await.unwrap_err();
    assert_eq!(err.record_type(), RecordType::A);
    assert_eq!(err.hostname(), hostname);
    assert_eq!(err.rcode(), Some(ResponseCode::Refused));
}

#[tokio::test]
async fn host_lookup_ignores_aliases() {
    let client = test_client().await;
    let ips = client
        .lookup_host(&ctx(), "cname.example.com")
        .await
        .unwrap();
    assert_eq!(ips, vec![IpAddr::V4(PUBLIC_V4)]);
}

#[tokio::test]
async fn restricted_addresses_are_filtered() {
    let server = serve().await;
    let strict = Client::new(vec![server], Duration::from_secs(10), 1);
    let ips = strict
        .lookup_host(&ctx(), "mixed.example.com")
        .await
        .unwrap();
    assert_eq!(ips, vec![IpAddr::V4(PUBLIC_V4), IpAddr::V6(PUBLIC_V6)]);

    let ips = strict.lookup_host(&ctx(), "dualstack.example.com").await.unwrap();
    assert!(ips.is_empty());

    let permissive = strict.with_restricted_addresses();
    let ips = permissive
        .lookup_host(&ctx(), "mixed.example.com")
        .await
        .unwrap();
    assert_eq!(ips.len(), 6);
    assert_eq!(ips[0], IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
    assert!(ips[..3].iter().all(IpAddr::is_ipv4));
    assert!(ips[3..].iter().all(IpAddr::is_ipv6));
}

#[tokio::test]
async fn lookup_caa() {
    let client = test_client().await;

    let caas = client.lookup_caa(&ctx(), "caa.example.com").await.unwrap();
    assert_eq!(caas.len(), 1);
    assert!(caas[0].tag().is_issue());

    let caas = client
        .lookup_caa(&ctx(), "nonexistent.example.com")
        .await
        .unwrap();
    assert!(caas.is_empty());

    // Answers are kept for response codes other than SERVFAIL.
    let caas = client.lookup_caa(&ctx(), "cname.example.com").await.unwrap();
    assert_eq!(caas.len(), 1, "should follow CNAME to find CAA");

    let caas = client
        .lookup_caa(&ctx(), "refused.example.com")
        .await
        .unwrap();
    assert!(caas.is_empty());
}

#[tokio::test]
async fn lookup_mx() {
    let client = test_client().await;

    let targets = client.lookup_mx(&ctx(), "email.example.com").await.unwrap();
    assert_eq!(
        targets,
        vec![
            "mail.example.com.".to_string(),
            "backup-mail.example.com.".to_string()
        ]
    );

    let err = client
        .lookup_mx(&ctx(), "nxdomain.example.com")
        .await
        .unwrap_err();
    assert_eq!(err.record_type(), RecordType::MX);
    assert_eq!(err.rcode(), Some(ResponseCode::NXDomain));
}

#[tokio::test]
async fn unreachable_server_times_out() {
    // A socket nobody reads from: every attempt waits out the read timeout.
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let client = Client::new(
        vec![silent.local_addr().unwrap().to_string()],
        Duration::from_millis(50),
        2,
    );

    let err = client
        .lookup_txt(&ctx(), "example.com")
        .await
        .unwrap_err();
    assert!(err.timeout());
    assert_eq!(
        err.to_string(),
        "DNS problem: query timed out looking up TXT for example.com"
    );
}
