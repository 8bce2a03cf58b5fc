//! End-to-end browse tests against a local mock directory service.

use content_directory::{BrowseObject, ContentDirectory, ContentDirectoryError, Feature};
use mockito::{Matcher, Server};
use upnp_schema::{parse_service_description, Service};

const CONTENT_DIRECTORY_SCPD: &str = r#"<?xml version="1.0"?>
<scpd xmlns="urn:schemas-upnp-org:service-1-0">
  <specVersion>
    <major>1</major>
    <minor>0</minor>
  </specVersion>
  <actionList>
    <action>
      <name>Browse</name>
      <argumentList>
        <argument>
          <name>ObjectID</name>
          <direction>in</direction>
          <relatedStateVariable>A_ARG_TYPE_ObjectID</relatedStateVariable>
        </argument>
        <argument>
          <name>BrowseFlag</name>
          <direction>in</direction>
          <relatedStateVariable>A_ARG_TYPE_BrowseFlag</relatedStateVariable>
        </argument>
        <argument>
          <name>Filter</name>
          <direction>in</direction>
          <relatedStateVariable>A_ARG_TYPE_Filter</relatedStateVariable>
        </argument>
        <argument>
          <name>StartingIndex</name>
          <direction>in</direction>
          <relatedStateVariable>A_ARG_TYPE_Index</relatedStateVariable>
        </argument>
        <argument>
          <name>RequestedCount</name>
          <direction>in</direction>
          <relatedStateVariable>A_ARG_TYPE_Count</relatedStateVariable>
        </argument>
        <argument>
          <name>SortCriteria</name>
          <direction>in</direction>
          <relatedStateVariable>A_ARG_TYPE_SortCriteria</relatedStateVariable>
        </argument>
        <argument>
          <name>Result</name>
          <direction>out</direction>
          <relatedStateVariable>A_ARG_TYPE_Result</relatedStateVariable>
        </argument>
        <argument>
          <name>NumberReturned</name>
          <direction>out</direction>
          <relatedStateVariable>A_ARG_TYPE_Count</relatedStateVariable>
        </argument>
        <argument>
          <name>TotalMatches</name>
          <direction>out</direction>
          <relatedStateVariable>A_ARG_TYPE_Count</relatedStateVariable>
        </argument>
        <argument>
          <name>UpdateID</name>
          <direction>out</direction>
          <relatedStateVariable>A_ARG_TYPE_UpdateID</relatedStateVariable>
        </argument>
      </argumentList>
    </action>
    <action>
      <name>GetSearchCapabilities</name>
      <argumentList>
        <argument>
          <name>SearchCaps</name>
          <direction>out</direction>
          <relatedStateVariable>SearchCapabilities</relatedStateVariable>
        </argument>
      </argumentList>
    </action>
    <action>
      <name>GetSystemUpdateID</name>
      <argumentList>
        <argument>
          <name>Id</name>
          <direction>out</direction>
          <relatedStateVariable>SystemUpdateID</relatedStateVariable>
        </argument>
      </argumentList>
    </action>
    <action>
      <name>GetFeatureList</name>
      <argumentList>
        <argument>
          <name>FeatureList</name>
          <direction>out</direction>
          <relatedStateVariable>A_ARG_TYPE_Featurelist</relatedStateVariable>
        </argument>
      </argumentList>
    </action>
  </actionList>
  <serviceStateTable>
    <stateVariable sendEvents="no">
      <name>A_ARG_TYPE_ObjectID</name>
      <dataType>string</dataType>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>A_ARG_TYPE_BrowseFlag</name>
      <dataType>string</dataType>
      <allowedValueList>
        <allowedValue>BrowseMetadata</allowedValue>
        <allowedValue>BrowseDirectChildren</allowedValue>
      </allowedValueList>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>A_ARG_TYPE_Filter</name>
      <dataType>string</dataType>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>A_ARG_TYPE_Index</name>
      <dataType>ui4</dataType>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>A_ARG_TYPE_Count</name>
      <dataType>ui4</dataType>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>A_ARG_TYPE_SortCriteria</name>
      <dataType>string</dataType>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>A_ARG_TYPE_Result</name>
      <dataType>string</dataType>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>A_ARG_TYPE_UpdateID</name>
      <dataType>ui4</dataType>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>A_ARG_TYPE_Featurelist</name>
      <dataType>string</dataType>
    </stateVariable>
    <stateVariable sendEvents="no">
      <name>SearchCapabilities</name>
      <dataType>string</dataType>
    </stateVariable>
    <stateVariable sendEvents="yes">
      <name>SystemUpdateID</name>
      <dataType>ui4</dataType>
    </stateVariable>
  </serviceStateTable>
</scpd>"#;

const NO_SUCH_OBJECT_FAULT: &str = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>701</errorCode><errorDescription>No such object</errorDescription></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;

fn content_directory(server_url: &str) -> ContentDirectory {
    let mut service = Service {
        service_type: "urn:schemas-upnp-org:service:ContentDirectory:1".to_string(),
        service_id: "urn:upnp-org:serviceId:ContentDirectory".to_string(),
        scpd_url: format!("{}/cd.xml", server_url),
        control_url: format!("{}/ctl/ContentDir", server_url),
        event_sub_url: format!("{}/evt/ContentDir", server_url),
        actions: Vec::new(),
        state_variables: Vec::new(),
    };
    service.merge_scpd(parse_service_description(CONTENT_DIRECTORY_SCPD).unwrap());
    ContentDirectory::new(service)
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn browse_response(didl: &str, number_returned: u32, total_matches: u32, update_id: u32) -> String {
    format!(
        "<?xml version=\"1.0\"?>\r\n\
        <s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\">\
        <s:Body>\
        <u:BrowseResponse xmlns:u=\"urn:schemas-upnp-org:service:ContentDirectory:1\">\
        <Result>{}</Result>\
        <NumberReturned>{}</NumberReturned>\
        <TotalMatches>{}</TotalMatches>\
        <UpdateID>{}</UpdateID>\
        </u:BrowseResponse>\
        </s:Body>\
        </s:Envelope>",
        xml_escape(didl),
        number_returned,
        total_matches,
        update_id
    )
}

fn didl_with_items(first_index: u32, count: u32) -> String {
    let mut didl = String::from(
        "<DIDL-Lite xmlns=\"urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
         xmlns:upnp=\"urn:schemas-upnp-org:metadata-1-0/upnp/\">",
    );
    for n in first_index..first_index + count {
        didl.push_str(&format!(
            "<item id=\"item-{0}\" parentID=\"33\" restricted=\"1\">\
             <dc:title>Track {0}</dc:title>\
             <upnp:class>object.item.audioItem.musicTrack</upnp:class>\
             </item>",
            n
        ));
    }
    didl.push_str("</DIDL-Lite>");
    didl
}

fn starting_index_matcher(index: u32) -> Matcher {
    Matcher::Regex(format!("<StartingIndex>{}</StartingIndex>", index))
}

#[test]
fn merges_pages_until_total_is_reached() {
    let mut server = Server::new();
    let first = server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(0))
        .with_status(200)
        .with_body(browse_response(&didl_with_items(0, 2), 2, 5, 7))
        .create();
    let second = server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(2))
        .with_status(200)
        .with_body(browse_response(&didl_with_items(2, 2), 2, 5, 9))
        .create();
    let third = server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(4))
        .with_status(200)
        .with_body(browse_response(&didl_with_items(4, 1), 1, 5, 9))
        .create();

    let directory = content_directory(&server.url());
    let listing = directory.browse_children("33", "*", 0, 2, "").unwrap();

    first.assert();
    second.assert();
    third.assert();

    let ids: Vec<&str> = listing.children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["item-0", "item-1", "item-2", "item-3", "item-4"]);
    assert_eq!(listing.counters.number_returned, 5);
    assert_eq!(listing.counters.total_matches, 5);
    // Counters other than the merged count stay pinned to the first page.
    assert_eq!(listing.counters.update_id, 7);
}

#[test]
fn empty_first_page_with_outstanding_total_is_a_stall() {
    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .with_status(200)
        .with_body(browse_response(&didl_with_items(0, 0), 0, 5, 7))
        .create();

    let directory = content_directory(&server.url());
    match directory.browse_children("33", "*", 0, 2, "") {
        Err(ContentDirectoryError::PaginationStalled { fetched, total }) => {
            assert_eq!(fetched, 0);
            assert_eq!(total, 5);
        }
        other => panic!("expected a stalled pagination, got {:?}", other),
    }
}

#[test]
fn later_page_without_progress_is_a_stall() {
    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(0))
        .with_status(200)
        .with_body(browse_response(&didl_with_items(0, 2), 2, 5, 7))
        .create();
    server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(2))
        .with_status(200)
        .with_body(browse_response(&didl_with_items(2, 0), 0, 5, 7))
        .create();

    let directory = content_directory(&server.url());
    match directory.browse_children("33", "*", 0, 2, "") {
        Err(ContentDirectoryError::PaginationStalled { fetched, total }) => {
            assert_eq!(fetched, 2);
            assert_eq!(total, 5);
        }
        other => panic!("expected a stalled pagination, got {:?}", other),
    }
}

#[test]
fn failed_later_page_returns_partial_listing() {
    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(0))
        .with_status(200)
        .with_body(browse_response(&didl_with_items(0, 2), 2, 5, 7))
        .create();
    server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(2))
        .with_status(500)
        .with_body(NO_SUCH_OBJECT_FAULT)
        .create();

    let directory = content_directory(&server.url());
    let listing = directory.browse_children("33", "*", 0, 2, "").unwrap();

    assert_eq!(listing.children.len(), 2);
    assert_eq!(listing.counters.number_returned, 2);
    assert_eq!(listing.counters.total_matches, 5);
}

#[test]
fn short_later_page_returns_partial_listing() {
    let short_body = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:BrowseResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1"><Result></Result><NumberReturned>0</NumberReturned><TotalMatches>5</TotalMatches></u:BrowseResponse></s:Body></s:Envelope>"#;

    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(0))
        .with_status(200)
        .with_body(browse_response(&didl_with_items(0, 2), 2, 5, 7))
        .create();
    server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(2))
        .with_status(200)
        .with_body(short_body)
        .create();

    let directory = content_directory(&server.url());
    let listing = directory.browse_children("33", "*", 0, 2, "").unwrap();

    assert_eq!(listing.children.len(), 2);
    assert_eq!(listing.counters.number_returned, 2);
}

#[test]
fn inflated_page_counts_saturate_instead_of_wrapping() {
    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(0))
        .with_status(200)
        .with_body(browse_response(
            &didl_with_items(0, 1),
            u32::MAX - 1,
            u32::MAX,
            7,
        ))
        .create();
    server
        .mock("POST", "/ctl/ContentDir")
        .match_body(starting_index_matcher(u32::MAX - 1))
        .with_status(200)
        .with_body(browse_response(&didl_with_items(1, 1), 5, u32::MAX, 7))
        .create();

    let directory = content_directory(&server.url());
    let listing = directory.browse_children("33", "*", 0, 2, "").unwrap();

    // The accumulator pins at the maximum and the loop ends instead of
    // wrapping back under the total.
    assert_eq!(listing.children.len(), 2);
    assert_eq!(listing.counters.number_returned, u32::MAX);
    assert_eq!(listing.counters.total_matches, u32::MAX);
}

#[test]
fn short_first_page_is_an_error() {
    let short_body = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:BrowseResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1"><Result></Result><NumberReturned>0</NumberReturned><TotalMatches>0</TotalMatches></u:BrowseResponse></s:Body></s:Envelope>"#;

    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .with_status(200)
        .with_body(short_body)
        .create();

    let directory = content_directory(&server.url());
    match directory.browse_children("33", "*", 0, 2, "") {
        Err(ContentDirectoryError::ShortResponse(count)) => assert_eq!(count, 3),
        other => panic!("expected a short response error, got {:?}", other),
    }
}

#[test]
fn single_page_listing_puts_containers_first() {
    let didl = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
<item id="item-9" parentID="AV" restricted="1"><dc:title>Stray</dc:title><upnp:class>object.item.audioItem</upnp:class></item>
<container id="AV_ALL" parentID="AV" restricted="0"><dc:title>All</dc:title><upnp:class>object.container</upnp:class></container>
</DIDL-Lite>"#;

    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .with_status(200)
        .with_body(browse_response(didl, 2, 2, 1))
        .create();

    let directory = content_directory(&server.url());
    let listing = directory.browse_children("AV", "*", 0, 10, "").unwrap();

    assert_eq!(listing.children.len(), 2);
    assert_eq!(listing.children[0].id, "AV_ALL");
    assert!(listing.children[0].is_container());
    assert_eq!(listing.children[1].id, "item-9");
    assert!(!listing.children[1].is_container());
}

#[test]
fn metadata_for_an_item_reads_resource_fields() {
    let didl = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
<item id="33$@155" parentID="33$466" restricted="1">
<dc:title>DTH-Unplugged</dc:title>
<dc:date>2015-02-08T09:54:25</dc:date>
<upnp:class>object.item.videoItem</upnp:class>
<res protocolInfo="http-get:*:video/avi:*" resolution="512x384" size="698892352" bitrate="196265" duration="0:59:20.000" nrAudioChannels="2" sampleFrequency="44100">http://192.168.0.16:50002/v/NDLNA/155.avi</res>
</item>
</DIDL-Lite>"#;

    let mut server = Server::new();
    let mock = server
        .mock("POST", "/ctl/ContentDir")
        .match_body(Matcher::Regex(
            "<BrowseFlag>BrowseMetadata</BrowseFlag>".to_string(),
        ))
        .with_status(200)
        .with_body(browse_response(didl, 1, 1, 2))
        .create();

    let directory = content_directory(&server.url());
    let result = directory.browse_metadata("33$@155", "*", 0, "").unwrap();

    mock.assert();
    assert_eq!(result.counters.number_returned, 1);
    let item = match result.object {
        Some(BrowseObject::Item(item)) => item,
        other => panic!("expected an item, got {:?}", other),
    };
    assert_eq!(item.id, "33$@155");
    assert_eq!(item.parent_id, "33$466");
    assert_eq!(item.title, "DTH-Unplugged");
    assert_eq!(item.class, "object.item.videoItem");
    assert!(item.restricted);
    assert_eq!(item.date, "2015-02-08T09:54:25");
    assert_eq!(item.protocol_info, "http-get:*:video/avi:*");
    assert_eq!(item.resolution, "512x384");
    assert_eq!(item.size, 698892352);
    assert_eq!(item.bitrate, 196265);
    assert_eq!(item.duration, "0:59:20.000");
    assert_eq!(item.nr_audio_channels, 2);
    assert_eq!(item.sample_frequency, 44100);
    assert_eq!(item.resource, "http://192.168.0.16:50002/v/NDLNA/155.avi");
}

#[test]
fn metadata_for_a_container_reads_container_fields() {
    let didl = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
<container id="AV_ALL" parentID="AV" restricted="0"><dc:title>All</dc:title><upnp:class>object.container</upnp:class><upnp:writeStatus>NOT_WRITABLE</upnp:writeStatus></container>
</DIDL-Lite>"#;

    let mut server = Server::new();
    let mock = server
        .mock("POST", "/ctl/ContentDir")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("<BrowseFlag>BrowseMetadata</BrowseFlag>".to_string()),
            Matcher::Regex("<StartingIndex>0</StartingIndex>".to_string()),
        ]))
        .with_status(200)
        .with_body(browse_response(didl, 1, 1, 2))
        .create();

    let directory = content_directory(&server.url());
    let result = directory.browse_metadata("AV_ALL", "*", 0, "").unwrap();

    mock.assert();
    let container = match result.object {
        Some(BrowseObject::Container(container)) => container,
        other => panic!("expected a container, got {:?}", other),
    };
    assert_eq!(container.id, "AV_ALL");
    assert_eq!(container.parent_id, "AV");
    assert_eq!(container.title, "All");
    assert_eq!(container.class, "object.container");
    assert!(!container.restricted);
    assert_eq!(container.write_status, "NOT_WRITABLE");
    assert_eq!(container.child_count, 0);
}

#[test]
fn metadata_with_neither_shape_yields_counters_only() {
    let didl = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"></DIDL-Lite>"#;

    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .with_status(200)
        .with_body(browse_response(didl, 0, 0, 3))
        .create();

    let directory = content_directory(&server.url());
    let result = directory.browse_metadata("gone", "*", 0, "").unwrap();

    assert!(result.object.is_none());
    assert_eq!(result.counters.update_id, 3);
}

#[test]
fn metadata_fault_is_a_typed_error() {
    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .with_status(500)
        .with_body(NO_SUCH_OBJECT_FAULT)
        .create();

    let directory = content_directory(&server.url());
    match directory.browse_metadata("does-not-exist", "*", 0, "") {
        Err(ContentDirectoryError::Fault {
            action,
            code,
            message,
        }) => {
            assert_eq!(action, "Browse");
            assert_eq!(code, 701);
            assert_eq!(message, "No such object");
        }
        other => panic!("expected a fault, got {:?}", other),
    }
}

#[test]
fn search_capabilities_come_back_verbatim() {
    let body = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:GetSearchCapabilitiesResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1"><SearchCaps>dc:title,upnp:class</SearchCaps></u:GetSearchCapabilitiesResponse></s:Body></s:Envelope>"#;

    let mut server = Server::new();
    let mock = server
        .mock("POST", "/ctl/ContentDir")
        .match_header(
            "soapaction",
            "\"urn:schemas-upnp-org:service:ContentDirectory:1#GetSearchCapabilities\"",
        )
        .with_status(200)
        .with_body(body)
        .create();

    let directory = content_directory(&server.url());
    let capabilities = directory.get_search_capabilities().unwrap();

    mock.assert();
    assert_eq!(capabilities, "dc:title,upnp:class");
}

#[test]
fn system_update_id_is_parsed_as_a_number() {
    let body = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><u:GetSystemUpdateIDResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1"><Id>123</Id></u:GetSystemUpdateIDResponse></s:Body></s:Envelope>"#;

    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .with_status(200)
        .with_body(body)
        .create();

    let directory = content_directory(&server.url());
    assert_eq!(directory.get_system_update_id().unwrap(), 123);
}

#[test]
fn feature_list_is_unwrapped_and_parsed() {
    let features_xml = r#"<Features xmlns="urn:schemas-upnp-org:av:avs"><Feature name="samsung.com_BASICVIEW" version="1"><ObjectIDs>AV_ALL</ObjectIDs></Feature></Features>"#;
    let body = format!(
        "<?xml version=\"1.0\"?>\r\n\
        <s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\">\
        <s:Body>\
        <u:GetFeatureListResponse xmlns:u=\"urn:schemas-upnp-org:service:ContentDirectory:1\">\
        <FeatureList>{}</FeatureList>\
        </u:GetFeatureListResponse>\
        </s:Body>\
        </s:Envelope>",
        xml_escape(features_xml)
    );

    let mut server = Server::new();
    server
        .mock("POST", "/ctl/ContentDir")
        .with_status(200)
        .with_body(body)
        .create();

    let directory = content_directory(&server.url());
    let features = directory.get_feature_list().unwrap();

    assert_eq!(
        features,
        vec![Feature {
            name: "samsung.com_BASICVIEW".to_string(),
            version: "1".to_string(),
            object_ids: vec!["AV_ALL".to_string()],
        }]
    );
}

#[test]
fn missing_action_is_reported_without_a_request() {
    // No server behind this address; the lookup must fail before any request.
    let directory = content_directory("http://127.0.0.1:9");

    match directory.get_service_reset_token() {
        Err(ContentDirectoryError::ActionNotSupported(name)) => {
            assert_eq!(name, "GetServiceResetToken");
        }
        other => panic!("expected ActionNotSupported, got {:?}", other),
    }
}
