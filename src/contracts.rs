use alloy::sol;

sol! {
    #[derive(Debug)]
    #[sol(rpc)]
    interface ILiquidityManager {
        event LiquidityTransferred(
            uint64 indexed ocrSeqNum,
            uint64 indexed fromChainSelector,
            uint64 indexed toChainSelector,
            address to,
            uint256 amount,
            bytes bridgeSpecificData,
            bytes bridgeReturnData
        );
    }

    #[derive(Debug)]
    interface IL2ArbitrumGateway {
        event DepositFinalized(address indexed l1Token, address indexed _from, address indexed _to, uint256 _amount);
        event WithdrawalInitiated(
            address l1Token,
            address indexed _from,
            address indexed _to,
            uint256 indexed _l2ToL1Id,
            uint256 _exitNum,
            uint256 _amount
        );
        event TxToL1(address indexed _from, address indexed _to, uint256 indexed _id, bytes _data);
    }

    #[derive(Debug)]
    #[sol(rpc)]
    interface IL1GatewayRouter {
        function getGateway(address _token) external view returns (address gateway);
    }

    #[derive(Debug)]
    #[sol(rpc)]
    interface IL1ArbitrumGateway {
        function counterpartGateway() external view returns (address);
        function getOutboundCalldata(
            address _token,
            address _from,
            address _to,
            uint256 _amount,
            bytes _data
        ) external view returns (bytes outboundCalldata);
    }

    #[derive(Debug)]
    #[sol(rpc)]
    interface IArbitrumInbox {
        function calculateRetryableSubmissionFee(uint256 dataLength, uint256 baseFee) external view returns (uint256);
    }

    #[derive(Debug)]
    interface IArbRollupCore {
        event NodeConfirmed(uint64 indexed nodeNum, bytes32 blockHash, bytes32 sendRoot);
    }

    #[derive(Debug)]
    #[sol(rpc)]
    interface INodeInterface {
        function estimateRetryableTicket(
            address sender,
            uint256 deposit,
            address to,
            uint256 l2CallValue,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            bytes data
        ) external;
        function constructOutboxProof(uint64 size, uint64 leaf) external view returns (bytes32 send, bytes32 root, bytes32[] proof);
    }

    #[derive(Debug)]
    interface IArbSys {
        event L2ToL1Tx(
            address caller,
            address indexed destination,
            uint256 indexed hash,
            uint256 indexed position,
            uint256 arbBlockNum,
            uint256 ethBlockNum,
            uint256 timestamp,
            uint256 callvalue,
            bytes data
        );
    }

    /// Fee bundle the L1 bridge adapter forwards into the retryable ticket.
    #[derive(Debug, PartialEq, Eq)]
    struct SendERC20Params {
        uint256 gasLimit;
        uint256 maxSubmissionCost;
        uint256 maxFeePerGas;
    }

    /// Arguments of `Outbox.executeTransaction`, passed to the L1 bridge adapter as one tuple.
    #[derive(Debug, PartialEq, Eq)]
    struct ArbitrumFinalizationPayload {
        bytes32[] proof;
        uint256 index;
        address l2Sender;
        address to;
        uint256 l2Block;
        uint256 l1Block;
        uint256 l2Timestamp;
        uint256 value;
        bytes data;
    }
}
